use crate::core::error::SyntaxError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Create,
    Table,
    Drop,
    And,
    Or,
    // 数据类型
    Int,
    Varchar,
    Float,
    Date,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier(String),
    String(String),
    Integer(i64),
    Float(f64),
    // 操作符
    Eq, // =
    Ne, // !=
    Lt, // <
    Gt, // >
    Le, // <=
    Ge, // >=
    // 分隔符
    LParen,    // (
    RParen,    // )
    Comma,     // ,
    Semicolon, // ;
    Asterisk,  // *
    Eof,
}

/// 一个记号：类型、原始文本和在输入中的字符位置
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub position: usize,
}

impl Keyword {
    pub fn lookup(word: &str) -> Option<Keyword> {
        let keyword = match word.to_uppercase().as_str() {
            "SELECT" => Keyword::Select,
            "FROM" => Keyword::From,
            "WHERE" => Keyword::Where,
            "INSERT" => Keyword::Insert,
            "INTO" => Keyword::Into,
            "VALUES" => Keyword::Values,
            "UPDATE" => Keyword::Update,
            "SET" => Keyword::Set,
            "DELETE" => Keyword::Delete,
            "CREATE" => Keyword::Create,
            "TABLE" => Keyword::Table,
            "DROP" => Keyword::Drop,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "INT" => Keyword::Int,
            "VARCHAR" => Keyword::Varchar,
            "FLOAT" => Keyword::Float,
            "DATE" => Keyword::Date,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Update => "UPDATE",
            Keyword::Set => "SET",
            Keyword::Delete => "DELETE",
            Keyword::Create => "CREATE",
            Keyword::Table => "TABLE",
            Keyword::Drop => "DROP",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Int => "INT",
            Keyword::Varchar => "VARCHAR",
            Keyword::Float => "FLOAT",
            Keyword::Date => "DATE",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(k) => write!(f, "keyword {}", k.as_str()),
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::String(s) => write!(f, "string '{}'", s),
            TokenKind::Integer(n) => write!(f, "number {}", n),
            TokenKind::Float(x) => write!(f, "number {:?}", x),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::Ne => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Le => write!(f, "'<='"),
            TokenKind::Ge => write!(f, "'>='"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Asterisk => write!(f, "'*'"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new() -> Self {
        Lexer {
            input: Vec::new(),
            position: 0,
        }
    }

    /// 将整条语句扫描为记号序列，末尾总是 `Eof`
    pub fn tokenize(&mut self, input: &str) -> Result<Vec<Token>, SyntaxError> {
        self.input = input.chars().collect();
        self.position = 0;
        let mut tokens = Vec::new();

        while let Some(c) = self.current() {
            // 跳过空白字符
            if c.is_whitespace() {
                self.position += 1;
                continue;
            }

            // 处理注释
            if c == '-' && self.peek() == Some('-') {
                self.skip_comment();
                continue;
            }

            let start = self.position;

            // 处理字符串
            if c == '\'' {
                tokens.push(self.read_string()?);
                continue;
            }

            // 处理数字，允许前导符号
            let signed = (c == '-' || c == '+') && self.peek().map_or(false, |n| n.is_ascii_digit());
            if c.is_ascii_digit() || signed {
                tokens.push(self.read_number()?);
                continue;
            }

            // 处理标识符和关键字
            if c.is_alphabetic() {
                let word = self.read_identifier();
                let kind = match Keyword::lookup(&word) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Identifier(word.clone()),
                };
                tokens.push(Token {
                    kind,
                    lexeme: word,
                    position: start,
                });
                continue;
            }

            // 两字符操作符优先于其单字符前缀
            let kind = match (c, self.peek()) {
                ('!', Some('=')) => TokenKind::Ne,
                ('<', Some('=')) => TokenKind::Le,
                ('>', Some('=')) => TokenKind::Ge,
                ('=', _) => TokenKind::Eq,
                ('<', _) => TokenKind::Lt,
                ('>', _) => TokenKind::Gt,
                ('(', _) => TokenKind::LParen,
                (')', _) => TokenKind::RParen,
                ('*', _) => TokenKind::Asterisk,
                (',', _) => TokenKind::Comma,
                (';', _) => TokenKind::Semicolon,
                _ => {
                    return Err(SyntaxError::UnexpectedCharacter {
                        ch: c,
                        position: start,
                    })
                }
            };
            let width = if matches!(kind, TokenKind::Ne | TokenKind::Le | TokenKind::Ge) {
                2
            } else {
                1
            };
            self.position += width;
            tokens.push(Token {
                kind,
                lexeme: self.input[start..self.position].iter().collect(),
                position: start,
            });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            position: self.position,
        });
        Ok(tokens)
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            self.position += 1;
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut identifier = String::new();
        while let Some(c) = self.current() {
            if c.is_alphanumeric() || c == '_' {
                identifier.push(c);
                self.position += 1;
            } else {
                break;
            }
        }
        identifier
    }

    fn read_number(&mut self) -> Result<Token, SyntaxError> {
        let start = self.position;
        let mut lexeme = String::new();
        let mut seen_dot = false;

        if let Some(sign @ ('-' | '+')) = self.current() {
            lexeme.push(sign);
            self.position += 1;
        }
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                lexeme.push(c);
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                lexeme.push(c);
            } else {
                break;
            }
            self.position += 1;
        }

        let invalid = || SyntaxError::InvalidNumber {
            lexeme: lexeme.clone(),
            position: start,
        };
        let kind = if seen_dot {
            TokenKind::Float(lexeme.parse().map_err(|_| invalid())?)
        } else {
            TokenKind::Integer(lexeme.parse().map_err(|_| invalid())?)
        };
        Ok(Token {
            kind,
            lexeme,
            position: start,
        })
    }

    // 字符串内不处理转义，遇到下一个单引号即结束
    fn read_string(&mut self) -> Result<Token, SyntaxError> {
        let start = self.position;
        self.position += 1;
        let mut value = String::new();
        loop {
            match self.current() {
                Some('\'') => {
                    self.position += 1;
                    break;
                }
                Some(c) => {
                    value.push(c);
                    self.position += 1;
                }
                None => return Err(SyntaxError::UnterminatedString { position: start }),
            }
        }
        Ok(Token {
            kind: TokenKind::String(value),
            lexeme: self.input[start..self.position].iter().collect(),
            position: start,
        })
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new().tokenize(input)
}

/// 按分号拆分脚本，字符串和注释中的分号不作为分隔符；空语句被丢弃
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut in_comment = false;
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            current.push(c);
            continue;
        }
        match c {
            '\'' => in_string = !in_string,
            '-' if !in_string && chars.peek() == Some(&'-') => in_comment = true,
            ';' if !in_string => {
                push_statement(&mut statements, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    push_statement(&mut statements, &current);
    statements
}

/// 文本在字符串和注释之外的最后一个有效字符是否为分号
pub fn statement_complete(text: &str) -> bool {
    let mut in_string = false;
    let mut in_comment = false;
    let mut last_code = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        match c {
            '\'' => in_string = !in_string,
            '-' if !in_string && chars.peek() == Some(&'-') => {
                in_comment = true;
                continue;
            }
            c if c.is_whitespace() => continue,
            _ => {}
        }
        last_code = Some(c);
    }
    !in_string && last_code == Some(';')
}

fn push_statement(statements: &mut Vec<String>, text: &str) {
    let has_code = text
        .lines()
        .any(|line| !line.trim().is_empty() && !line.trim_start().starts_with("--"));
    if has_code {
        statements.push(text.trim().to_string());
    }
}

use super::lexer::{tokenize, Keyword, Token, TokenKind};
use super::{Condition, LogicalOp, Operator, SelectColumns, Statement};
use crate::core::error::SyntaxError;
use crate::core::types::{Column, ColumnType, Value};

/// 递归下降解析器，只检查结构，不访问数据库
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let position = tokens.last().map_or(0, |t| t.position + t.lexeme.chars().count());
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                position,
            });
        }
        Parser {
            tokens,
            position: 0,
        }
    }

    pub fn parse(mut self) -> Result<Statement, SyntaxError> {
        let statement = self.parse_statement()?;

        // 末尾的分号可有可无
        if self.peek().kind == TokenKind::Semicolon {
            self.next();
        }
        if self.peek().kind != TokenKind::Eof {
            return Err(self.unexpected("end of statement"));
        }
        Ok(statement)
    }

    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Keyword(Keyword::Create) => self.parse_create_table(),
            TokenKind::Keyword(Keyword::Insert) => self.parse_insert(),
            TokenKind::Keyword(Keyword::Select) => self.parse_select(),
            TokenKind::Keyword(Keyword::Update) => self.parse_update(),
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete(),
            TokenKind::Keyword(Keyword::Drop) => self.parse_drop_table(),
            TokenKind::Eof => Err(SyntaxError::EmptyStatement),
            other => Err(SyntaxError::UnknownStatement {
                found: other.to_string(),
                position: token.position,
            }),
        }
    }

    fn parse_create_table(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword(Keyword::Create)?;
        self.expect_keyword(Keyword::Table)?;
        let name = self.expect_identifier("table name")?;

        self.expect(TokenKind::LParen, "'('")?;
        let mut columns = Vec::new();
        loop {
            let column_name = self.expect_identifier("column name")?;
            let data_type = self.parse_column_type()?;
            columns.push(Column::new(column_name, data_type));

            if !self.list_continues()? {
                break;
            }
        }

        Ok(Statement::CreateTable { name, columns })
    }

    fn parse_column_type(&mut self) -> Result<ColumnType, SyntaxError> {
        match self.peek().kind {
            TokenKind::Keyword(Keyword::Int) => {
                self.next();
                Ok(ColumnType::Int)
            }
            TokenKind::Keyword(Keyword::Float) => {
                self.next();
                Ok(ColumnType::Float)
            }
            TokenKind::Keyword(Keyword::Date) => {
                self.next();
                Ok(ColumnType::Date)
            }
            TokenKind::Keyword(Keyword::Varchar) => {
                self.next();
                if self.peek().kind != TokenKind::LParen {
                    return Ok(ColumnType::Varchar(None));
                }
                self.next();
                let size = match self.peek().kind {
                    TokenKind::Integer(n) if n >= 0 => n as usize,
                    _ => return Err(self.unexpected("column size")),
                };
                self.next();
                self.expect(TokenKind::RParen, "')'")?;
                Ok(ColumnType::Varchar(Some(size)))
            }
            _ => Err(self.unexpected("column type (INT, VARCHAR, FLOAT or DATE)")),
        }
    }

    fn parse_insert(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let table = self.expect_identifier("table name")?;

        // 可选的列名列表
        let columns = if self.peek().kind == TokenKind::LParen {
            self.next();
            let mut columns = Vec::new();
            loop {
                columns.push(self.expect_identifier("column name")?);
                if !self.list_continues()? {
                    break;
                }
            }
            Some(columns)
        } else {
            None
        };

        self.expect_keyword(Keyword::Values)?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_value()?);
            if !self.list_continues()? {
                break;
            }
        }

        Ok(Statement::Insert {
            table,
            columns,
            values,
        })
    }

    fn parse_select(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword(Keyword::Select)?;

        let columns = if self.peek().kind == TokenKind::Asterisk {
            self.next();
            SelectColumns::All
        } else {
            let mut columns = vec![self.expect_identifier("column name or '*'")?];
            while self.peek().kind == TokenKind::Comma {
                self.next();
                columns.push(self.expect_identifier("column name")?);
            }
            SelectColumns::Named(columns)
        };

        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier("table name")?;
        let condition = self.parse_optional_where()?;

        Ok(Statement::Select {
            columns,
            table,
            condition,
        })
    }

    fn parse_update(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword(Keyword::Update)?;
        let table = self.expect_identifier("table name")?;
        self.expect_keyword(Keyword::Set)?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier("column name")?;
            self.expect(TokenKind::Eq, "'='")?;
            let value = self.parse_value()?;
            assignments.push((column, value));

            if self.peek().kind != TokenKind::Comma {
                break;
            }
            self.next();
        }

        let condition = self.parse_optional_where()?;
        Ok(Statement::Update {
            table,
            assignments,
            condition,
        })
    }

    fn parse_delete(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier("table name")?;
        let condition = self.parse_optional_where()?;
        Ok(Statement::Delete { table, condition })
    }

    fn parse_drop_table(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword(Keyword::Drop)?;
        self.expect_keyword(Keyword::Table)?;
        let name = self.expect_identifier("table name")?;
        Ok(Statement::DropTable { name })
    }

    fn parse_optional_where(&mut self) -> Result<Option<Condition>, SyntaxError> {
        if self.peek().kind != TokenKind::Keyword(Keyword::Where) {
            return Ok(None);
        }
        self.next();

        // 从左到右折叠，AND/OR 同级
        let mut condition = self.parse_comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Keyword(Keyword::And) => LogicalOp::And,
                TokenKind::Keyword(Keyword::Or) => LogicalOp::Or,
                _ => break,
            };
            self.next();
            let right = self.parse_comparison()?;
            condition = Condition::combine(condition, op, right);
        }
        Ok(Some(condition))
    }

    fn parse_comparison(&mut self) -> Result<Condition, SyntaxError> {
        let column = self.expect_identifier("column name")?;
        let operator = match self.peek().kind {
            TokenKind::Eq => Operator::Eq,
            TokenKind::Ne => Operator::Ne,
            TokenKind::Lt => Operator::Lt,
            TokenKind::Gt => Operator::Gt,
            TokenKind::Le => Operator::Le,
            TokenKind::Ge => Operator::Ge,
            _ => return Err(self.unexpected("comparison operator")),
        };
        self.next();
        let value = self.parse_value()?;
        Ok(Condition::compare(column, operator, value))
    }

    fn parse_value(&mut self) -> Result<Value, SyntaxError> {
        let value = match &self.peek().kind {
            TokenKind::Integer(n) => Value::Int(*n),
            TokenKind::Float(x) => Value::Float(*x),
            TokenKind::String(s) => Value::Varchar(s.clone()),
            _ => return Err(self.unexpected("literal value")),
        };
        self.next();
        Ok(value)
    }

    // 逗号分隔列表：遇到逗号返回 true，遇到右括号返回 false 并消费它
    fn list_continues(&mut self) -> Result<bool, SyntaxError> {
        match self.peek().kind {
            TokenKind::Comma => {
                self.next();
                Ok(true)
            }
            TokenKind::RParen => {
                self.next();
                Ok(false)
            }
            _ => Err(self.unexpected("',' or ')'")),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, SyntaxError> {
        if self.peek().kind == kind {
            Ok(self.next())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, SyntaxError> {
        self.expect(TokenKind::Keyword(keyword), keyword.as_str())
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<String, SyntaxError> {
        if let TokenKind::Identifier(name) = &self.peek().kind {
            let name = name.clone();
            self.next();
            Ok(name)
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        SyntaxError::UnexpectedToken {
            expected: expected.to_string(),
            found: token.kind.to_string(),
            position: token.position,
        }
    }

    fn peek(&self) -> &Token {
        // 构造时保证末尾有 Eof
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }
}

/// 对一条语句做词法和语法分析
pub fn parse(sql: &str) -> Result<Statement, SyntaxError> {
    Parser::new(tokenize(sql)?).parse()
}

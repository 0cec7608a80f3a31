mod executor;
mod formatter;
mod lexer;
mod parser;

pub use executor::{QueryResult, SqlExecutor};
pub use formatter::TableFormatter;
pub use lexer::{split_statements, statement_complete, tokenize, Keyword, Lexer, Token, TokenKind};
pub use parser::{parse, Parser};

use crate::core::error::SyntaxError;
use crate::core::types::{Column, Value};

// SQL语句类型
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable {
        name: String,
        columns: Vec<Column>,
    },
    Insert {
        table: String,
        columns: Option<Vec<String>>,
        values: Vec<Value>,
    },
    Select {
        columns: SelectColumns,
        table: String,
        condition: Option<Condition>,
    },
    Update {
        table: String,
        assignments: Vec<(String, Value)>,
        condition: Option<Condition>,
    },
    Delete {
        table: String,
        condition: Option<Condition>,
    },
    DropTable {
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectColumns {
    All,
    Named(Vec<String>),
}

// 比较操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// WHERE 条件树
///
/// AND 与 OR 没有优先级之分，按书写顺序从左到右折叠：
/// `a AND b OR c` 即 `(a AND b) OR c`，`a OR b AND c` 即 `(a OR b) AND c`。
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: String,
        operator: Operator,
        value: Value,
    },
    Logical {
        left: Box<Condition>,
        op: LogicalOp,
        right: Box<Condition>,
    },
}

impl Operator {
    pub fn is_equality(&self) -> bool {
        matches!(self, Operator::Eq | Operator::Ne)
    }
}

impl Condition {
    pub fn compare(column: impl Into<String>, operator: Operator, value: Value) -> Self {
        Condition::Compare {
            column: column.into(),
            operator,
            value,
        }
    }

    pub fn combine(left: Condition, op: LogicalOp, right: Condition) -> Self {
        Condition::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// 条件中引用到的所有列名，按出现顺序
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Condition::Compare { column, .. } => vec![column.as_str()],
            Condition::Logical { left, right, .. } => {
                let mut columns = left.columns();
                columns.extend(right.columns());
                columns
            }
        }
    }
}

// SQL解析器：词法分析 + 语法分析
pub struct SqlParser {
    lexer: Lexer,
}

impl SqlParser {
    pub fn new() -> Self {
        SqlParser {
            lexer: Lexer::new(),
        }
    }

    pub fn parse(&mut self, sql: &str) -> Result<Statement, SyntaxError> {
        let tokens = self.lexer.tokenize(sql)?;
        Parser::new(tokens).parse()
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}

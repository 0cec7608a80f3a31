use thiserror::Error;

/// 词法/语法阶段的错误，总是原样返回给调用方
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("unterminated string starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("invalid numeric literal '{lexeme}' at position {position}")]
    InvalidNumber { lexeme: String, position: usize },

    #[error("expected {expected}, found {found} at position {position}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("unknown statement starting with {found} at position {position}")]
    UnknownStatement { found: String, position: usize },

    #[error("empty statement")]
    EmptyStatement,
}

/// 执行阶段针对当前数据库状态的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticError {
    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    #[error("table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("column '{column}' does not exist in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("column '{column}' is listed more than once for table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("{columns} column(s) but {values} value(s)")]
    ArityMismatch { columns: usize, values: usize },

    #[error("cannot compare column '{column}' value {left} with {right}")]
    TypeMismatch {
        column: String,
        left: String,
        right: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Semantic,
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Semantic error: {0}")]
    Semantic(#[from] SemanticError),
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Syntax(_) => ErrorKind::Syntax,
            DbError::Semantic(_) => ErrorKind::Semantic,
        }
    }

    // 详细错误信息，包含出错的记号与位置
    pub fn detailed_message(&self) -> String {
        self.to_string()
    }

    // 简略错误信息
    pub fn brief_message(&self) -> String {
        match self {
            DbError::Syntax(_) => "Error: Syntax error".to_string(),
            DbError::Semantic(SemanticError::TableNotFound(_)) => "Error: Table not found".to_string(),
            DbError::Semantic(SemanticError::TableAlreadyExists(_)) => {
                "Error: Table already exists".to_string()
            }
            DbError::Semantic(SemanticError::ColumnNotFound { .. }) => {
                "Error: Column not found".to_string()
            }
            DbError::Semantic(SemanticError::DuplicateColumn { .. }) => {
                "Error: Duplicate column".to_string()
            }
            DbError::Semantic(SemanticError::ArityMismatch { .. }) => {
                "Error: Column/value count mismatch".to_string()
            }
            DbError::Semantic(SemanticError::TypeMismatch { .. }) => "Error: Type mismatch".to_string(),
        }
    }
}

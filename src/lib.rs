pub mod cli;
pub mod core;

pub use crate::core::db::Database;
pub use crate::core::error::{DbError, ErrorKind, SemanticError, SyntaxError};
pub use crate::core::sql::{QueryResult, Statement, TableFormatter};
pub use crate::core::types::{Column, ColumnType, RowSet, Table, TableInfo, Value};

use crate::core::sql::split_statements;

/// 创建一个空的内存数据库，宿主需在多次调用之间持有它
pub fn new_database() -> Database {
    Database::new()
}

/// 编译并执行一条SQL语句
///
/// 失败时数据库保持调用前的状态，调用方可以继续提交下一条语句。
pub fn compile_and_run(sql: &str, db: &mut Database) -> Result<QueryResult, DbError> {
    db.execute_sql(sql)
}

/// 脚本中一条语句的执行情况
#[derive(Debug)]
pub struct ScriptOutcome {
    pub sql: String,
    pub result: Result<QueryResult, DbError>,
}

/// 按顺序执行以分号分隔的多条语句，某条失败不影响后续语句
pub fn run_script(script: &str, db: &mut Database) -> Vec<ScriptOutcome> {
    split_statements(script)
        .into_iter()
        .map(|sql| {
            let result = compile_and_run(&sql, db);
            ScriptOutcome { sql, result }
        })
        .collect()
}

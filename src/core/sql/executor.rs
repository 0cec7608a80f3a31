use super::Statement;
use crate::core::db::Database;
use crate::core::error::DbError;
use crate::core::types::RowSet;

/// 一条语句的执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// SELECT 的结果集
    Rows(RowSet),
    /// INSERT/UPDATE/DELETE 影响的行数
    Affected { count: usize, message: String },
    /// CREATE/DROP 的成功确认
    Status { message: String },
}

impl QueryResult {
    pub fn rows(&self) -> Option<&RowSet> {
        match self {
            QueryResult::Rows(set) => Some(set),
            _ => None,
        }
    }

    pub fn affected(&self) -> Option<usize> {
        match self {
            QueryResult::Affected { count, .. } => Some(*count),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            QueryResult::Rows(set) => format!("{} row(s) returned", set.len()),
            QueryResult::Affected { message, .. } | QueryResult::Status { message } => message.clone(),
        }
    }
}

/// 把语句分派到存储的对应操作，错误原样上抛
pub struct SqlExecutor<'a> {
    db: &'a mut Database,
}

impl<'a> SqlExecutor<'a> {
    pub fn new(db: &'a mut Database) -> Self {
        SqlExecutor { db }
    }

    pub fn execute(&mut self, statement: Statement) -> Result<QueryResult, DbError> {
        match statement {
            Statement::CreateTable { name, columns } => {
                self.db.create_table(&name, columns)?;
                Ok(QueryResult::Status {
                    message: format!("Table '{}' created", name),
                })
            }
            Statement::Insert {
                table,
                columns,
                values,
            } => {
                self.db.insert(&table, values, columns.as_deref())?;
                Ok(QueryResult::Affected {
                    count: 1,
                    message: format!("1 row inserted into '{}'", table),
                })
            }
            Statement::Select {
                columns,
                table,
                condition,
            } => {
                let set = self.db.select(&table, &columns, condition.as_ref())?;
                Ok(QueryResult::Rows(set))
            }
            Statement::Update {
                table,
                assignments,
                condition,
            } => {
                let count = self.db.update(&table, &assignments, condition.as_ref())?;
                Ok(QueryResult::Affected {
                    count,
                    message: format!("{} row(s) updated in '{}'", count, table),
                })
            }
            Statement::Delete { table, condition } => {
                let count = self.db.delete(&table, condition.as_ref())?;
                Ok(QueryResult::Affected {
                    count,
                    message: format!("{} row(s) deleted from '{}'", count, table),
                })
            }
            Statement::DropTable { name } => {
                self.db.drop_table(&name)?;
                Ok(QueryResult::Status {
                    message: format!("Table '{}' dropped", name),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SemanticError;
    use crate::core::sql::parse;
    use crate::core::types::Value;

    fn run(db: &mut Database, sql: &str) -> Result<QueryResult, DbError> {
        SqlExecutor::new(db).execute(parse(sql)?)
    }

    #[test]
    fn dispatches_every_statement_kind() {
        let mut db = Database::new();
        let created = run(&mut db, "CREATE TABLE t (a INT, b VARCHAR(5))").unwrap();
        assert_eq!(created.message(), "Table 't' created");

        let inserted = run(&mut db, "INSERT INTO t VALUES (1, 'x')").unwrap();
        assert_eq!(inserted.affected(), Some(1));
        assert_eq!(inserted.message(), "1 row inserted into 't'");

        let selected = run(&mut db, "SELECT b FROM t").unwrap();
        assert_eq!(selected.rows().unwrap().rows, vec![vec![Value::Varchar("x".to_string())]]);

        let updated = run(&mut db, "UPDATE t SET b = 'y'").unwrap();
        assert_eq!(updated.message(), "1 row(s) updated in 't'");

        let deleted = run(&mut db, "DELETE FROM t WHERE a = 2").unwrap();
        assert_eq!(deleted.affected(), Some(0));

        let dropped = run(&mut db, "DROP TABLE t").unwrap();
        assert_eq!(dropped, QueryResult::Status { message: "Table 't' dropped".to_string() });
        assert!(db.list_tables().is_empty());
    }

    #[test]
    fn store_errors_propagate_unchanged() {
        let mut db = Database::new();
        match run(&mut db, "DELETE FROM ghost").unwrap_err() {
            DbError::Semantic(err) => assert_eq!(err, SemanticError::TableNotFound("ghost".to_string())),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

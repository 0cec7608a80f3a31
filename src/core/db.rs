use std::collections::{HashMap, HashSet};

use crate::core::error::{DbError, SemanticError};
use crate::core::sql::{Condition, LogicalOp, Operator, QueryResult, SelectColumns, SqlExecutor, SqlParser};
use crate::core::types::{Column, Row, RowSet, Table, TableInfo, Value};

/// 进程内的关系存储：表名到表的映射
///
/// 所有修改操作先完成校验再落地，失败时数据库保持调用前的状态。
#[derive(Debug, Default, Clone)]
pub struct Database {
    tables: HashMap<String, Table>,
}

impl Database {
    pub fn new() -> Self {
        Database {
            tables: HashMap::new(),
        }
    }

    // SQL操作
    pub fn execute_sql(&mut self, sql: &str) -> Result<QueryResult, DbError> {
        let statement = SqlParser::new().parse(sql)?;
        SqlExecutor::new(self).execute(statement)
    }

    // 表操作
    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> Result<(), SemanticError> {
        if self.tables.contains_key(name) {
            return Err(SemanticError::TableAlreadyExists(name.to_string()));
        }
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(SemanticError::DuplicateColumn {
                    table: name.to_string(),
                    column: column.name.clone(),
                });
            }
        }
        self.tables
            .insert(name.to_string(), Table::new(name.to_string(), columns));
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<(), SemanticError> {
        self.tables
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| SemanticError::TableNotFound(name.to_string()))
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn table_info(&self, name: &str) -> Result<TableInfo, SemanticError> {
        Ok(self.table(name)?.info())
    }

    // 数据操作

    /// 插入一行；给出列名列表时未列出的列填 NULL
    pub fn insert(
        &mut self,
        table_name: &str,
        values: Vec<Value>,
        columns: Option<&[String]>,
    ) -> Result<(), SemanticError> {
        let table = self.table_mut(table_name)?;

        let row = match columns {
            None => {
                if values.len() != table.columns.len() {
                    return Err(SemanticError::ArityMismatch {
                        columns: table.columns.len(),
                        values: values.len(),
                    });
                }
                values
            }
            Some(columns) => {
                if columns.len() != values.len() {
                    return Err(SemanticError::ArityMismatch {
                        columns: columns.len(),
                        values: values.len(),
                    });
                }
                let mut row: Row = vec![Value::Null; table.columns.len()];
                let mut assigned = vec![false; table.columns.len()];
                for (column, value) in columns.iter().zip(values) {
                    let index = column_index(table, column)?;
                    if assigned[index] {
                        return Err(SemanticError::DuplicateColumn {
                            table: table.name.clone(),
                            column: column.clone(),
                        });
                    }
                    assigned[index] = true;
                    row[index] = value;
                }
                row
            }
        };

        table.rows.push(row);
        Ok(())
    }

    pub fn select(
        &self,
        table_name: &str,
        columns: &SelectColumns,
        condition: Option<&Condition>,
    ) -> Result<RowSet, SemanticError> {
        let table = self.table(table_name)?;

        let (names, indexes): (Vec<String>, Vec<usize>) = match columns {
            SelectColumns::All => (table.column_names(), (0..table.columns.len()).collect()),
            SelectColumns::Named(names) => {
                let indexes = names
                    .iter()
                    .map(|name| column_index(table, name))
                    .collect::<Result<Vec<_>, _>>()?;
                (names.clone(), indexes)
            }
        };

        let matches = matching_rows(table, condition)?;
        let rows: Vec<Row> = table
            .rows
            .iter()
            .zip(matches)
            .filter(|(_, matched)| *matched)
            .map(|(row, _)| indexes.iter().map(|&i| row[i].clone()).collect::<Row>())
            .collect();

        Ok(RowSet {
            columns: names,
            rows,
        })
    }

    /// 原地更新匹配的行，返回受影响的行数
    pub fn update(
        &mut self,
        table_name: &str,
        assignments: &[(String, Value)],
        condition: Option<&Condition>,
    ) -> Result<usize, SemanticError> {
        let table = self.table_mut(table_name)?;

        let targets = assignments
            .iter()
            .map(|(column, value)| Ok((column_index(table, column)?, value)))
            .collect::<Result<Vec<_>, SemanticError>>()?;
        let matches = matching_rows(table, condition)?;

        let mut count = 0;
        for (row, matched) in table.rows.iter_mut().zip(matches) {
            if !matched {
                continue;
            }
            for (index, value) in &targets {
                row[*index] = (*value).clone();
            }
            count += 1;
        }
        Ok(count)
    }

    /// 删除匹配的行，剩余行保持原有相对顺序
    pub fn delete(&mut self, table_name: &str, condition: Option<&Condition>) -> Result<usize, SemanticError> {
        let table = self.table_mut(table_name)?;

        let matches = matching_rows(table, condition)?;
        let before = table.rows.len();
        let mut flags = matches.into_iter();
        table.rows.retain(|_| !flags.next().unwrap_or(false));
        Ok(before - table.rows.len())
    }

    fn table(&self, name: &str) -> Result<&Table, SemanticError> {
        self.tables
            .get(name)
            .ok_or_else(|| SemanticError::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table, SemanticError> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| SemanticError::TableNotFound(name.to_string()))
    }
}

fn column_index(table: &Table, column: &str) -> Result<usize, SemanticError> {
    table.column_index(column).ok_or_else(|| SemanticError::ColumnNotFound {
        table: table.name.clone(),
        column: column.to_string(),
    })
}

// 先对所有行求值，任何错误都发生在修改之前
fn matching_rows(table: &Table, condition: Option<&Condition>) -> Result<Vec<bool>, SemanticError> {
    let condition = match condition {
        Some(condition) => condition,
        None => return Ok(vec![true; table.rows.len()]),
    };
    for column in condition.columns() {
        column_index(table, column)?;
    }
    table
        .rows
        .iter()
        .map(|row| evaluate(table, row, condition))
        .collect()
}

/// 对一行数据求条件树的值
///
/// OR 不短路，两侧都会求值；求值本身没有副作用。
pub fn evaluate(table: &Table, row: &Row, condition: &Condition) -> Result<bool, SemanticError> {
    match condition {
        Condition::Compare {
            column,
            operator,
            value,
        } => {
            let index = column_index(table, column)?;
            let cell = row.get(index).ok_or_else(|| SemanticError::ColumnNotFound {
                table: table.name.clone(),
                column: column.clone(),
            })?;
            compare(column, cell, *operator, value)
        }
        Condition::Logical { left, op, right } => {
            let left = evaluate(table, row, left)?;
            let right = evaluate(table, row, right)?;
            Ok(match op {
                LogicalOp::And => left && right,
                LogicalOp::Or => left || right,
            })
        }
    }
}

fn compare(column: &str, cell: &Value, operator: Operator, literal: &Value) -> Result<bool, SemanticError> {
    let ordering = match cell.compare(literal) {
        Some(ordering) => ordering,
        // 不同类型只可能不相等
        None if operator.is_equality() => return Ok(operator == Operator::Ne),
        // 与 NULL 的大小比较恒为假，不像字符串与数字那样报 TypeMismatch
        None if cell.is_null() || literal.is_null() => return Ok(false),
        None => {
            return Err(SemanticError::TypeMismatch {
                column: column.to_string(),
                left: cell.to_literal(),
                right: literal.to_literal(),
            })
        }
    };
    Ok(match operator {
        Operator::Eq => ordering.is_eq(),
        Operator::Ne => ordering.is_ne(),
        Operator::Lt => ordering.is_lt(),
        Operator::Gt => ordering.is_gt(),
        Operator::Le => ordering.is_le(),
        Operator::Ge => ordering.is_ge(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ColumnType;

    fn students() -> Database {
        let mut db = Database::new();
        db.create_table(
            "s",
            vec![
                Column::new("id", ColumnType::Int),
                Column::new("name", ColumnType::Varchar(Some(10))),
                Column::new("age", ColumnType::Int),
            ],
        )
        .unwrap();
        for (id, name, age) in [(1, "A", 20), (2, "B", 19), (3, "C", 22)] {
            db.insert("s", vec![Value::Int(id), Value::Varchar(name.to_string()), Value::Int(age)], None)
                .unwrap();
        }
        db
    }

    fn ids(db: &Database) -> Vec<Value> {
        db.get_table("s").unwrap().rows.iter().map(|r| r[0].clone()).collect()
    }

    #[test]
    fn create_table_twice_fails() {
        let mut db = students();
        let err = db.create_table("s", vec![Column::new("x", ColumnType::Int)]).unwrap_err();
        assert_eq!(err, SemanticError::TableAlreadyExists("s".to_string()));
        assert_eq!(db.get_table("s").unwrap().columns.len(), 3);
        assert_eq!(db.get_table("s").unwrap().rows.len(), 3);
    }

    #[test]
    fn create_table_rejects_duplicate_columns() {
        let mut db = Database::new();
        let err = db
            .create_table("t", vec![Column::new("a", ColumnType::Int), Column::new("a", ColumnType::Float)])
            .unwrap_err();
        assert!(matches!(err, SemanticError::DuplicateColumn { .. }));
        assert!(db.get_table("t").is_none());
    }

    #[test]
    fn partial_insert_fills_null() {
        let mut db = students();
        let columns = vec!["name".to_string(), "id".to_string()];
        db.insert("s", vec![Value::Varchar("D".to_string()), Value::Int(4)], Some(&columns))
            .unwrap();
        let last = db.get_table("s").unwrap().rows.last().unwrap().clone();
        assert_eq!(last, vec![Value::Int(4), Value::Varchar("D".to_string()), Value::Null]);
    }

    #[test]
    fn insert_arity_and_column_errors() {
        let mut db = students();
        let err = db.insert("s", vec![Value::Int(9)], None).unwrap_err();
        assert_eq!(err, SemanticError::ArityMismatch { columns: 3, values: 1 });

        let columns = vec!["id".to_string(), "nope".to_string()];
        let err = db.insert("s", vec![Value::Int(9), Value::Int(9)], Some(&columns)).unwrap_err();
        assert!(matches!(err, SemanticError::ColumnNotFound { .. }));

        let columns = vec!["id".to_string(), "id".to_string()];
        let err = db.insert("s", vec![Value::Int(9), Value::Int(8)], Some(&columns)).unwrap_err();
        assert!(matches!(err, SemanticError::DuplicateColumn { .. }));

        assert_eq!(db.get_table("s").unwrap().rows.len(), 3);
    }

    #[test]
    fn select_projects_in_requested_order() {
        let db = students();
        let columns = SelectColumns::Named(vec!["age".to_string(), "id".to_string()]);
        let condition = Condition::compare("age", Operator::Ge, Value::Int(20));
        let set = db.select("s", &columns, Some(&condition)).unwrap();
        assert_eq!(set.columns, vec!["age".to_string(), "id".to_string()]);
        assert_eq!(
            set.rows,
            vec![vec![Value::Int(20), Value::Int(1)], vec![Value::Int(22), Value::Int(3)]]
        );
    }

    #[test]
    fn unknown_condition_column_fails_even_without_rows() {
        let mut db = Database::new();
        db.create_table("e", vec![Column::new("a", ColumnType::Int)]).unwrap();
        let condition = Condition::compare("b", Operator::Eq, Value::Int(1));
        let err = db.select("e", &SelectColumns::All, Some(&condition)).unwrap_err();
        assert!(matches!(err, SemanticError::ColumnNotFound { .. }));
    }

    #[test]
    fn update_is_all_or_nothing() {
        let mut db = students();
        let before = db.get_table("s").unwrap().clone();
        let assignments = vec![
            ("age".to_string(), Value::Int(30)),
            ("missing".to_string(), Value::Int(1)),
        ];
        let err = db.update("s", &assignments, None).unwrap_err();
        assert!(matches!(err, SemanticError::ColumnNotFound { .. }));
        assert_eq!(db.get_table("s").unwrap(), &before);
    }

    #[test]
    fn update_counts_matching_rows() {
        let mut db = students();
        let condition = Condition::compare("age", Operator::Lt, Value::Int(21));
        let count = db.update("s", &[("age".to_string(), Value::Int(0))], Some(&condition)).unwrap();
        assert_eq!(count, 2);
        assert_eq!(ids(&db), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(db.get_table("s").unwrap().rows[2][2], Value::Int(22));
    }

    #[test]
    fn delete_keeps_survivor_order() {
        let mut db = students();
        let condition = Condition::compare("id", Operator::Eq, Value::Int(2));
        assert_eq!(db.delete("s", Some(&condition)).unwrap(), 1);
        assert_eq!(ids(&db), vec![Value::Int(1), Value::Int(3)]);
        assert_eq!(db.delete("s", None).unwrap(), 2);
        assert!(db.get_table("s").unwrap().rows.is_empty());
    }

    #[test]
    fn type_mismatch_ordering_is_an_error() {
        let mut db = students();
        let condition = Condition::compare("name", Operator::Gt, Value::Int(1));
        let err = db.delete("s", Some(&condition)).unwrap_err();
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));
        assert_eq!(db.get_table("s").unwrap().rows.len(), 3);
    }

    #[test]
    fn update_leaves_table_untouched_when_condition_fails() {
        let mut db = students();
        let before = db.get_table("s").unwrap().clone();
        // 第一行已经命中，第二行比较 name 时出错
        let condition = Condition::combine(
            Condition::compare("age", Operator::Eq, Value::Int(20)),
            LogicalOp::Or,
            Condition::compare("name", Operator::Gt, Value::Int(1)),
        );
        let assignments = vec![("age".to_string(), Value::Int(99))];
        let err = db.update("s", &assignments, Some(&condition)).unwrap_err();
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));
        assert_eq!(db.get_table("s").unwrap(), &before);
    }

    #[test]
    fn equality_across_types_and_null_ordering() {
        let db = students();
        let table = db.get_table("s").unwrap();
        let row = &table.rows[0];
        let eq = Condition::compare("name", Operator::Eq, Value::Int(1));
        let ne = Condition::compare("name", Operator::Ne, Value::Int(1));
        assert!(!evaluate(table, row, &eq).unwrap());
        assert!(evaluate(table, row, &ne).unwrap());

        let null_row = vec![Value::Int(5), Value::Null, Value::Null];
        let gt = Condition::compare("age", Operator::Gt, Value::Int(1));
        assert!(!evaluate(table, &null_row, &gt).unwrap());
    }

    #[test]
    fn mixed_and_or_fold_left_to_right() {
        let db = students();
        let table = db.get_table("s").unwrap();
        // (id = 1 OR id = 2) AND age > 19 → 只有 id 1
        let condition = Condition::combine(
            Condition::combine(
                Condition::compare("id", Operator::Eq, Value::Int(1)),
                LogicalOp::Or,
                Condition::compare("id", Operator::Eq, Value::Int(2)),
            ),
            LogicalOp::And,
            Condition::compare("age", Operator::Gt, Value::Int(19)),
        );
        let matched: Vec<bool> = table
            .rows
            .iter()
            .map(|row| evaluate(table, row, &condition).unwrap())
            .collect();
        assert_eq!(matched, vec![true, false, false]);
    }

    #[test]
    fn drop_and_list_tables() {
        let mut db = students();
        db.create_table("a", vec![Column::new("x", ColumnType::Date)]).unwrap();
        assert_eq!(db.list_tables(), vec!["a".to_string(), "s".to_string()]);
        db.drop_table("s").unwrap();
        assert_eq!(db.drop_table("s").unwrap_err(), SemanticError::TableNotFound("s".to_string()));
        assert_eq!(db.list_tables(), vec!["a".to_string()]);
        assert_eq!(db.table_info("a").unwrap().row_count, 0);
    }
}

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde_json::{json, Map, Value};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::core::db::Database;
use crate::core::error::DbError;
use crate::core::sql::{split_statements, statement_complete, QueryResult, TableFormatter};
use crate::core::types::RowSet;

#[derive(Parser, Debug)]
#[command(author, version, about = "A minimal in-memory SQL engine", long_about = None)]
pub struct Cli {
    /// SQL to execute, may be given several times
    #[arg(short, long = "execute", value_name = "SQL")]
    pub execute: Vec<String>,

    /// Script file with statements separated by ';'
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Print short error messages without token positions
    #[arg(long)]
    pub brief: bool,

    /// Stop at the first failing statement
    #[arg(long)]
    pub stop_on_error: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

// 错误显示模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisplayMode {
    Brief,    // 简略错误信息
    Detailed, // 详细错误信息
}

impl Cli {
    /// 运行命令行，返回失败语句的数量
    pub fn run(&self) -> anyhow::Result<usize> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        if self.file.is_none() && self.execute.is_empty() {
            let stdin = io::stdin();
            self.session().repl(stdin.lock(), &mut out)?;
            return Ok(0);
        }
        self.run_batch(&mut out)
    }

    /// 非交互模式：先执行脚本文件，再执行 `-e` 给出的语句
    pub fn run_batch<W: Write>(&self, out: &mut W) -> anyhow::Result<usize> {
        let mut session = self.session();
        let mut failures = 0;

        let mut scripts = Vec::new();
        if let Some(path) = &self.file {
            let script = fs::read_to_string(path)
                .with_context(|| format!("failed to read script {}", path.display()))?;
            scripts.push(script);
        }
        scripts.extend(self.execute.iter().cloned());

        for script in &scripts {
            for sql in split_statements(script) {
                if !session.execute(&sql, out)? {
                    failures += 1;
                    if self.stop_on_error {
                        return Ok(failures);
                    }
                }
            }
        }
        Ok(failures)
    }

    fn session(&self) -> Session {
        let error_mode = if self.brief {
            ErrorDisplayMode::Brief
        } else {
            ErrorDisplayMode::Detailed
        };
        Session::new(self.format, error_mode)
    }
}

/// 结果集转为 JSON 数组，每行一个对象，键按投影列的顺序排列
pub fn rows_to_json(set: &RowSet) -> Value {
    let rows = set
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = set
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| (column.clone(), json!(value)))
                .collect();
            Value::Object(object)
        })
        .collect();
    Value::Array(rows)
}

/// 宿主侧会话：持有数据库并负责输出结果
pub struct Session {
    db: Database,
    format: OutputFormat,
    error_mode: ErrorDisplayMode,
}

impl Session {
    pub fn new(format: OutputFormat, error_mode: ErrorDisplayMode) -> Self {
        Session {
            db: Database::new(),
            format,
            error_mode,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // 切换错误显示模式
    pub fn toggle_error_mode(&mut self) -> ErrorDisplayMode {
        self.error_mode = match self.error_mode {
            ErrorDisplayMode::Brief => ErrorDisplayMode::Detailed,
            ErrorDisplayMode::Detailed => ErrorDisplayMode::Brief,
        };
        self.error_mode
    }

    // 根据当前模式格式化错误信息
    pub fn format_error(&self, error: &DbError) -> String {
        match self.error_mode {
            ErrorDisplayMode::Brief => error.brief_message(),
            ErrorDisplayMode::Detailed => error.detailed_message(),
        }
    }

    /// 执行一条语句并输出，成功返回 true
    pub fn execute<W: Write>(&mut self, sql: &str, out: &mut W) -> io::Result<bool> {
        match self.db.execute_sql(sql) {
            Ok(result) => {
                self.write_result(&result, out)?;
                Ok(true)
            }
            Err(error) => {
                self.write_error(&error, out)?;
                Ok(false)
            }
        }
    }

    fn write_result<W: Write>(&self, result: &QueryResult, out: &mut W) -> io::Result<()> {
        match (self.format, result) {
            (OutputFormat::Table, QueryResult::Rows(set)) => {
                write!(out, "{}", TableFormatter::format(set))?;
                writeln!(out, "{}", result.message())
            }
            (OutputFormat::Table, _) => writeln!(out, "{}", result.message()),
            (OutputFormat::Json, QueryResult::Rows(set)) => writeln!(out, "{}", rows_to_json(set)),
            (OutputFormat::Json, _) => {
                let value = json!({
                    "affected": result.affected(),
                    "message": result.message(),
                });
                writeln!(out, "{}", value)
            }
        }
    }

    fn write_error<W: Write>(&self, error: &DbError, out: &mut W) -> io::Result<()> {
        match self.format {
            OutputFormat::Table => writeln!(out, "{}", self.format_error(error)),
            OutputFormat::Json => {
                let value = json!({
                    "error": format!("{:?}", error.kind()),
                    "message": self.format_error(error),
                });
                writeln!(out, "{}", value)
            }
        }
    }

    /// 交互式循环；SQL 以分号结束，可以跨多行输入
    pub fn repl<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> io::Result<()> {
        writeln!(out, "MiniSQL - 内存SQL引擎")?;
        writeln!(out, "输入 'help' 获取帮助信息, 'exit' 退出程序")?;

        let mut sql_buffer = String::new();
        loop {
            // 根据是否在继续输入SQL语句显示不同的提示符
            write!(out, "{}", if sql_buffer.is_empty() { "> " } else { "-> " })?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // 特殊命令只在缓冲区为空时识别，不需要分号
            if sql_buffer.is_empty() {
                let mut words = line.split_whitespace();
                match (words.next(), words.next()) {
                    (Some("exit" | "quit"), None) => break,
                    (Some("help"), None) => {
                        self.write_help(out)?;
                        continue;
                    }
                    (Some("list"), None) => {
                        let tables = self.db.list_tables();
                        if tables.is_empty() {
                            writeln!(out, "没有表")?;
                        } else {
                            writeln!(out, "表列表:")?;
                            for table in tables {
                                writeln!(out, "  {}", table)?;
                            }
                        }
                        continue;
                    }
                    (Some("describe"), Some(name)) => {
                        match self.db.table_info(name) {
                            Ok(info) => {
                                writeln!(out, "{} ({} 行)", info.name, info.row_count)?;
                                for column in &info.columns {
                                    writeln!(out, "  {} {}", column.name, column.data_type)?;
                                }
                            }
                            Err(err) => self.write_error(&err.into(), out)?,
                        }
                        continue;
                    }
                    (Some("mode"), None) => {
                        let mode = self.toggle_error_mode();
                        writeln!(out, "错误显示模式: {:?}", mode)?;
                        continue;
                    }
                    _ => {}
                }
            } else if line == "clear" {
                writeln!(out, "已清除当前SQL缓冲区")?;
                sql_buffer.clear();
                continue;
            }

            sql_buffer.push_str(line);
            sql_buffer.push('\n');

            // 语句还没有以分号结束（忽略行尾注释），继续接受输入
            if !statement_complete(&sql_buffer) {
                continue;
            }
            let script = std::mem::take(&mut sql_buffer);
            self.execute_script(&script, out)?;
        }

        // 输入结束时执行缓冲区中剩余的语句，分号可省略
        self.execute_script(&sql_buffer, out)
    }

    fn execute_script<W: Write>(&mut self, script: &str, out: &mut W) -> io::Result<()> {
        for sql in split_statements(script) {
            self.execute(&sql, out)?;
        }
        Ok(())
    }

    fn write_help<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "可用命令:")?;
        writeln!(out, "  help            - 显示帮助信息")?;
        writeln!(out, "  exit            - 退出程序")?;
        writeln!(out, "  list            - 列出所有表")?;
        writeln!(out, "  describe <表名> - 显示表结构")?;
        writeln!(out, "  mode            - 切换简略/详细错误信息")?;
        writeln!(out, "  clear           - 清除当前SQL缓冲区")?;
        writeln!(out, "SQL命令: (以分号结束)")?;
        writeln!(out, "  CREATE TABLE table_name (column1 type1, column2 type2, ...);")?;
        writeln!(out, "  DROP TABLE table_name;")?;
        writeln!(out, "  INSERT INTO table_name [(column, ...)] VALUES (value1, value2, ...);")?;
        writeln!(out, "  UPDATE table_name SET column = value [WHERE condition];")?;
        writeln!(out, "  DELETE FROM table_name [WHERE condition];")?;
        writeln!(out, "  SELECT * | column, ... FROM table_name [WHERE condition];")?;
        Ok(())
    }
}

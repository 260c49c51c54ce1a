//! CSV task files
//!
//! The first non-blank row is the header. Header cells are matched
//! case-insensitively, ignoring spaces, underscores and hyphens, so
//! `Start Date`, `start_date` and `START-DATE` all name the start column.
//!
//! | Field | Accepted headers |
//! |-------|------------------|
//! | id | `id`, `task id` |
//! | name | `name`, `task`, `title` |
//! | start | `start`, `start date` |
//! | end | `end`, `end date`, `due`, `due date` |
//! | category | `category`, `sub-phase`; `phase` as a fallback |
//! | priority | `priority` |
//! | assignee | `assignee`, `owner` |
//! | milestone | `milestone`, `is milestone` |
//! | description | `description`, `objective` |
//! | dependencies | `dependencies`, `depends on` (`;` or `,` separated) |
//!
//! A missing id falls back to the name. Unknown columns are ignored. Quoted
//! cells may contain commas, doubled quotes and line breaks. Errors name the
//! line the record starts on and the header of the offending column.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};

use super::task_file::TaskFileError;
use crate::domain::{Task, TaskId};

/// Date layouts tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Id,
    Name,
    Start,
    End,
    Category,
    Phase,
    Priority,
    Assignee,
    Milestone,
    Description,
    Dependencies,
}

impl Field {
    fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        let field = match key.as_str() {
            "id" | "taskid" => Field::Id,
            "name" | "task" | "title" => Field::Name,
            "start" | "startdate" => Field::Start,
            "end" | "enddate" | "due" | "duedate" => Field::End,
            "category" | "subphase" => Field::Category,
            "phase" => Field::Phase,
            "priority" => Field::Priority,
            "assignee" | "owner" => Field::Assignee,
            "milestone" | "ismilestone" => Field::Milestone,
            "description" | "objective" => Field::Description,
            "dependencies" | "dependson" => Field::Dependencies,
            _ => return None,
        };
        Some(field)
    }

    fn label(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Name => "name",
            Field::Start => "start",
            Field::End => "end",
            Field::Category => "category",
            Field::Phase => "phase",
            Field::Priority => "priority",
            Field::Assignee => "assignee",
            Field::Milestone => "milestone",
            Field::Description => "description",
            Field::Dependencies => "dependencies",
        }
    }
}

/// One CSV record and the line it starts on
#[derive(Debug, Clone, PartialEq)]
struct Record {
    line: usize,
    cells: Vec<String>,
}

impl Record {
    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// Splits `content` into records, honouring quoted cells
fn records(content: &str) -> Result<Vec<Record>, TaskFileError> {
    let mut records = Vec::new();
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    cell.push(c);
                }
                _ => cell.push(c),
            }
            continue;
        }

        match c {
            '"' if cell.trim().is_empty() => {
                cell.clear();
                in_quotes = true;
            }
            ',' => cells.push(std::mem::take(&mut cell)),
            '\r' => {}
            '\n' => {
                cells.push(std::mem::take(&mut cell));
                records.push(Record {
                    line: record_line,
                    cells: std::mem::take(&mut cells),
                });
                line += 1;
                record_line = line;
            }
            _ => cell.push(c),
        }
    }

    if in_quotes {
        return Err(TaskFileError::UnterminatedQuote(record_line));
    }
    if !cell.is_empty() || !cells.is_empty() {
        cells.push(cell);
        records.push(Record {
            line: record_line,
            cells,
        });
    }

    Ok(records)
}

/// Header positions of the recognized fields
struct Columns {
    headers: Vec<String>,
    index: HashMap<Field, usize>,
}

impl Columns {
    fn from_header(header: &Record) -> Result<Self, TaskFileError> {
        let headers: Vec<String> = header.cells.iter().map(|h| h.trim().to_string()).collect();
        let mut index = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            if let Some(field) = Field::from_header(h) {
                // First matching column wins
                index.entry(field).or_insert(i);
            }
        }

        for field in [Field::Start, Field::End] {
            if !index.contains_key(&field) {
                return Err(TaskFileError::MissingColumn(field.label()));
            }
        }
        if !index.contains_key(&Field::Id) && !index.contains_key(&Field::Name) {
            return Err(TaskFileError::MissingColumn(Field::Id.label()));
        }

        Ok(Self { headers, index })
    }

    /// Trimmed, non-empty cell for `field`
    fn get<'r>(&self, field: Field, record: &'r Record) -> Option<&'r str> {
        let i = *self.index.get(&field)?;
        record
            .cells
            .get(i)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    fn invalid(&self, field: Field, record: &Record, message: String) -> TaskFileError {
        let column = self
            .index
            .get(&field)
            .and_then(|&i| self.headers.get(i))
            .map_or(field.label(), String::as_str);
        TaskFileError::InvalidCell {
            line: record.line,
            column: column.to_string(),
            message,
        }
    }

    fn date(&self, field: Field, record: &Record) -> Result<NaiveDate, TaskFileError> {
        let value = self
            .get(field, record)
            .ok_or_else(|| self.invalid(field, record, "missing value".to_string()))?;
        parse_date(value)
            .ok_or_else(|| self.invalid(field, record, format!("invalid date '{}'", value)))
    }

    fn task(&self, record: &Record) -> Result<Task, TaskFileError> {
        let name = self.get(Field::Name, record);
        let raw_id = self
            .get(Field::Id, record)
            .or(name)
            .ok_or_else(|| self.invalid(Field::Id, record, "missing value".to_string()))?;
        let id = TaskId::new(raw_id).map_err(|e| self.invalid(Field::Id, record, e.to_string()))?;

        let start = self.date(Field::Start, record)?;
        let end = self.date(Field::End, record)?;

        let mut task = Task::new(id, name.unwrap_or(raw_id), start, end);

        if let Some(category) = self
            .get(Field::Category, record)
            .or_else(|| self.get(Field::Phase, record))
        {
            task = task.with_category(category);
        }
        if let Some(value) = self.get(Field::Priority, record) {
            let priority = value.parse().map_err(|_| {
                self.invalid(Field::Priority, record, format!("invalid priority '{}'", value))
            })?;
            task = task.with_priority(priority);
        }
        if let Some(assignee) = self.get(Field::Assignee, record) {
            task = task.with_assignee(assignee);
        }
        if self.get(Field::Milestone, record).is_some_and(is_truthy) {
            task = task.as_milestone();
        }
        if let Some(description) = self.get(Field::Description, record) {
            task = task.with_description(description);
        }
        if let Some(deps) = self.get(Field::Dependencies, record) {
            for dep in deps.split([';', ',']).map(str::trim).filter(|d| !d.is_empty()) {
                let dep = TaskId::new(dep)
                    .map_err(|e| self.invalid(Field::Dependencies, record, e.to_string()))?;
                task = task.depending_on(dep);
            }
        }

        Ok(task)
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}

/// Any non-empty flag except an explicit no
fn is_truthy(value: &str) -> bool {
    !matches!(
        value.to_ascii_lowercase().as_str(),
        "false" | "no" | "n" | "0"
    )
}

/// Parses a whole CSV document into tasks, in file order
pub fn parse_tasks(content: &str) -> Result<Vec<Task>, TaskFileError> {
    let mut rows = records(content)?.into_iter().filter(|r| !r.is_blank());

    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let columns = Columns::from_header(&header)?;

    rows.map(|record| columns.task(&record)).collect()
}

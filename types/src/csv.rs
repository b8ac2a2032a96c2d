//! CSV export of report rows.

use std::fmt::Write;

use crate::report::ReportRow;

pub const HEADER: &str = "Name,Email,Role,Created At";

/// Render rows as CSV. Role is the display label, the date is the UTC
/// calendar date. Fields are quoted per RFC 4180 when they need to be.
pub fn export(rows: &[ReportRow]) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + rows.len() * 64);
    out.push_str(HEADER);
    out.push('\n');

    for row in rows {
        let role = row.role.map(|r| r.label()).unwrap_or_default();
        let created = row.created_at.strftime("%Y-%m-%d");

        let _ = writeln!(
            out,
            "{},{},{},{}",
            field(&row.name),
            field(&row.email),
            field(role),
            created
        );
    }

    out
}

fn field(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\"")).into()
    } else {
        value.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    /// Minimal RFC 4180 reader, enough to check what `export` writes.
    fn parse(text: &str) -> Vec<Vec<String>> {
        let mut records = Vec::new();
        let mut record = Vec::new();
        let mut current = String::new();
        let mut quoted = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match (quoted, c) {
                (true, '"') if chars.peek() == Some(&'"') => {
                    chars.next();
                    current.push('"');
                }
                (true, '"') => quoted = false,
                (true, c) => current.push(c),
                (false, '"') => quoted = true,
                (false, ',') => record.push(std::mem::take(&mut current)),
                (false, '\n') => {
                    record.push(std::mem::take(&mut current));
                    records.push(std::mem::take(&mut record));
                }
                (false, c) => current.push(c),
            }
        }

        records
    }

    fn row(name: &str, email: &str, role: Option<Role>, created: &str) -> ReportRow {
        ReportRow {
            id: 1,
            name: name.into(),
            email: email.into(),
            role,
            created_at: created.parse().unwrap(),
        }
    }

    #[test]
    fn round_trips_by_column() {
        let rows = [
            row("Ada Lovelace", "ada@example.com", Some(Role::Admin), "2024-02-10T09:00:00Z"),
            row("Hopper, Grace", "grace@example.com", Some(Role::Employee), "2024-02-29T23:59:59Z"),
            row("Jo \"JJ\" Jones", "jo@example.com", None, "2023-12-01T00:00:00Z"),
        ];

        let parsed = parse(&export(&rows));

        assert_eq!(parsed[0], ["Name", "Email", "Role", "Created At"]);
        assert_eq!(parsed[1], ["Ada Lovelace", "ada@example.com", "Administrator", "2024-02-10"]);
        assert_eq!(parsed[2], ["Hopper, Grace", "grace@example.com", "Employee", "2024-02-29"]);
        assert_eq!(parsed[3], ["Jo \"JJ\" Jones", "jo@example.com", "", "2023-12-01"]);
        assert_eq!(parsed.len(), 4);
    }

    #[test]
    fn plain_fields_are_not_quoted() {
        let text = export(&[row("Ada", "ada@example.com", Some(Role::SuperAdmin), "2024-01-01T00:00:00Z")]);
        assert_eq!(text, "Name,Email,Role,Created At\nAda,ada@example.com,Super Admin,2024-01-01\n");
    }

    #[test]
    fn empty_export_is_header_only() {
        assert_eq!(export(&[]), format!("{HEADER}\n"));
    }
}

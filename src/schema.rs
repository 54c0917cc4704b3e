//! Schema synthesis: header labels in, [`RowEntity`] descriptor out.
//!
//! Every header becomes one `TEXT` column named `data_<header>` in the table. Records address
//! columns through a Column Key, a slug of the header that is stable across runs and unique
//! within the entity.

use std::collections::HashSet;

use crate::types::{Column, RowEntity};

/// Default display name for rendered records.
pub const DEFAULT_ENTITY_NAME: &str = "ExcelRow";
/// Default table name.
pub const DEFAULT_TABLE_NAME: &str = "exceldata";
/// Name of the identity column.
pub const ID_COLUMN: &str = "id";

const LABEL_PREFIX: &str = "data_";

/// Derive the base Column Key for a header label.
///
/// Lowercases ASCII letters, keeps ASCII digits, and collapses every other run of characters into a
/// single `_`. Leading/trailing `_` are trimmed. An empty result becomes `column`; a result starting
/// with a digit is prefixed with `c_`.
///
/// This is a pure function of `header`. Distinct headers can share a base key; use
/// [`RowEntity::from_headers`] to get disambiguated keys.
pub fn column_key(header: &str) -> String {
    let mut key = String::with_capacity(header.len());
    let mut pending_sep = false;
    for ch in header.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    if key.is_empty() {
        return "column".to_string();
    }
    if key.starts_with(|c: char| c.is_ascii_digit()) {
        key.insert_str(0, "c_");
    }
    key
}

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

impl RowEntity {
    /// Build an entity from ordered header labels.
    ///
    /// Keys and physical labels that would collide get a `_2`, `_3`, ... suffix in header order.
    /// Label collisions are checked case-insensitively, matching SQLite's column name rules. The
    /// key `id` is reserved for the identity column.
    pub fn from_headers(
        name: impl Into<String>,
        table: impl Into<String>,
        headers: &[String],
    ) -> Self {
        let mut used_keys: HashSet<String> = HashSet::new();
        used_keys.insert(ID_COLUMN.to_string());
        let mut used_labels: HashSet<String> = HashSet::new();

        let columns = headers
            .iter()
            .map(|header| {
                let key = disambiguate(column_key(header), &mut used_keys, |s| s.to_string());
                let label = disambiguate(
                    format!("{LABEL_PREFIX}{header}"),
                    &mut used_labels,
                    str::to_lowercase,
                );
                Column {
                    header: header.clone(),
                    key,
                    label,
                }
            })
            .collect();

        Self {
            name: name.into(),
            table: table.into(),
            columns,
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this entity.
    pub fn create_table_sql(&self) -> String {
        let mut defs = vec![format!("{} INTEGER PRIMARY KEY", quote_ident(ID_COLUMN))];
        defs.extend(
            self.columns
                .iter()
                .map(|c| format!("{} TEXT", quote_ident(&c.label))),
        );
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.table),
            defs.join(", ")
        )
    }

    /// Parameterised `INSERT` statement; parameters follow column order.
    pub fn insert_sql(&self) -> String {
        if self.columns.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES", quote_ident(&self.table));
        }
        let names: Vec<String> = self.columns.iter().map(|c| quote_ident(&c.label)).collect();
        let params: Vec<String> = (1..=self.columns.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table),
            names.join(", "),
            params.join(", ")
        )
    }

    /// `SELECT` of the identity column followed by every text column, ordered by id.
    pub fn select_all_sql(&self) -> String {
        let mut names = vec![quote_ident(ID_COLUMN)];
        names.extend(self.columns.iter().map(|c| quote_ident(&c.label)));
        format!(
            "SELECT {} FROM {} ORDER BY {}",
            names.join(", "),
            quote_ident(&self.table),
            quote_ident(ID_COLUMN)
        )
    }
}

fn disambiguate<F>(base: String, used: &mut HashSet<String>, normalize: F) -> String
where
    F: Fn(&str) -> String,
{
    let mut candidate = base.clone();
    let mut n = 2;
    while !used.insert(normalize(&candidate)) {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::{column_key, quote_ident};
    use crate::types::{RowEntity, RowRecord};

    fn headers(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn column_key_slugifies_labels() {
        assert_eq!(column_key("Name"), "name");
        assert_eq!(column_key("First Name"), "first_name");
        assert_eq!(column_key("  Unit price ($) "), "unit_price");
        assert_eq!(column_key("2024 total"), "c_2024_total");
        assert_eq!(column_key("ÄÖÜ"), "column");
        assert_eq!(column_key(""), "column");
    }

    #[test]
    fn column_key_is_pure() {
        assert_eq!(column_key("Order-Date"), column_key("Order-Date"));
    }

    #[test]
    fn from_headers_builds_data_labels() {
        let entity = RowEntity::from_headers("ExcelRow", "exceldata", &headers(&["Name", "Age"]));
        let labels: Vec<&str> = entity.columns.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["data_Name", "data_Age"]);
        assert_eq!(entity.keys().collect::<Vec<_>>(), vec!["name", "age"]);
    }

    #[test]
    fn colliding_keys_are_disambiguated() {
        let entity = RowEntity::from_headers(
            "ExcelRow",
            "exceldata",
            &headers(&["First Name", "first_name", "Name", "Name", "ID"]),
        );
        assert_eq!(
            entity.keys().collect::<Vec<_>>(),
            vec!["first_name", "first_name_2", "name", "name_2", "id_2"]
        );
        let labels: Vec<&str> = entity.columns.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["data_First Name", "data_first_name", "data_Name", "data_Name_2", "data_ID"]
        );
    }

    #[test]
    fn labels_differing_only_in_case_are_disambiguated() {
        let entity = RowEntity::from_headers("ExcelRow", "t", &headers(&["Name", "name"]));
        assert_eq!(entity.columns[1].label, "data_name_2");
    }

    #[test]
    fn resolve_header_follows_occurrence_order() {
        let entity = RowEntity::from_headers("ExcelRow", "t", &headers(&["A", "B", "A"]));
        assert_eq!(entity.resolve_header("A", 0), Some(0));
        assert_eq!(entity.resolve_header("A", 1), Some(2));
        assert_eq!(entity.resolve_header("A", 2), None);
        assert_eq!(entity.resolve_header("C", 0), None);
    }

    #[test]
    fn sql_statements_quote_identifiers() {
        let entity = RowEntity::from_headers("ExcelRow", "my table", &headers(&["Say \"hi\""]));
        assert_eq!(
            entity.create_table_sql(),
            r#"CREATE TABLE IF NOT EXISTS "my table" ("id" INTEGER PRIMARY KEY, "data_Say ""hi""" TEXT)"#
        );
        assert_eq!(
            entity.insert_sql(),
            r#"INSERT INTO "my table" ("data_Say ""hi""") VALUES (?1)"#
        );
        assert_eq!(
            entity.select_all_sql(),
            r#"SELECT "id", "data_Say ""hi""" FROM "my table" ORDER BY "id""#
        );
        assert_eq!(quote_ident("plain"), "\"plain\"");
    }

    #[test]
    fn insert_sql_without_columns_uses_default_values() {
        let entity = RowEntity::from_headers("ExcelRow", "t", &[]);
        assert_eq!(entity.insert_sql(), r#"INSERT INTO "t" DEFAULT VALUES"#);
    }

    #[test]
    fn render_matches_record_format() {
        let entity = RowEntity::from_headers("ExcelRow", "t", &headers(&["Name", "Age", "Note"]));
        let mut record = RowRecord::new(vec![
            Some("Alice".to_string()),
            Some("30".to_string()),
            None,
        ]);
        assert_eq!(
            entity.render(&record),
            "<ExcelRow(id=-1, data_Name='Alice', data_Age='30', data_Note=None)>"
        );
        record.id = Some(7);
        assert_eq!(
            entity.render(&record),
            "<ExcelRow(id=7, data_Name='Alice', data_Age='30', data_Note=None)>"
        );
        assert_eq!(record.get(&entity, "age"), Some(&Some("30".to_string())));
        assert_eq!(record.get(&entity, "missing"), None);
    }
}

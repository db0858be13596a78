//! Roster records.

/// A raw row as read from the roster table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    /// 1-based line in the source table; the header is line 1.
    pub row: usize,
    /// Name cell, untrimmed.
    pub name: String,
    /// Email cell, untrimmed.
    pub email: String,
}

impl RosterRow {
    /// Creates a new row.
    #[must_use]
    pub fn new(row: usize, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            row,
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A participant eligible for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Source line of the values.
    pub row: usize,
    /// Trimmed display name; the join key into the certificate index.
    pub name: String,
    /// Trimmed email address (may be empty).
    pub email: String,
}

impl Contact {
    /// Creates a contact, trimming both fields.
    #[must_use]
    pub fn new(row: usize, name: &str, email: &str) -> Self {
        Self {
            row,
            name: name.trim().to_string(),
            email: email.trim().to_string(),
        }
    }

    /// Returns true when both name and email are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.email.is_empty()
    }

    /// Returns a display string for the contact.
    ///
    /// If an email is present, returns "Name <email>", otherwise just the name.
    /// A blank name shows as `(未填姓名)`.
    #[must_use]
    pub fn display(&self) -> String {
        let name = if self.name.is_empty() {
            "(未填姓名)"
        } else {
            self.name.as_str()
        };
        if self.email.is_empty() {
            name.to_string()
        } else {
            format!("{name} <{}>", self.email)
        }
    }
}

impl From<RosterRow> for Contact {
    fn from(row: RosterRow) -> Self {
        Self::new(row.row, &row.name, &row.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_are_trimmed() {
        let contact = Contact::from(RosterRow::new(2, "  王小明 ", "\tming@example.com "));
        assert_eq!(contact.name, "王小明");
        assert_eq!(contact.email, "ming@example.com");
        assert_eq!(contact.row, 2);
        assert!(contact.is_complete());
    }

    #[test]
    fn test_display_with_email() {
        let contact = Contact::new(3, "王小明", "ming@example.com");
        assert_eq!(contact.display(), "王小明 <ming@example.com>");
    }

    #[test]
    fn test_display_without_email() {
        let contact = Contact::new(3, "王小明", "  ");
        assert_eq!(contact.display(), "王小明");
        assert!(!contact.is_complete());
    }

    #[test]
    fn test_display_without_name() {
        assert_eq!(Contact::new(4, " ", "b@x.com").display(), "(未填姓名) <b@x.com>");
        assert_eq!(Contact::new(5, "", "").display(), "(未填姓名)");
    }
}

//! Revision model
//!
//! A revision is one ordered unit of SQL. On disk it is a block comment
//! header followed by the raw statements:
//!
//! ```text
//! /*
//! Revision: users/20060102150405
//! Author:   Jane <jane@example.com>
//!
//! Add the users table
//! */
//!
//! CREATE TABLE users (id INT NOT NULL);
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::str::FromStr;

use crate::error::{RevisionError, RevisionResult};

/// Layout of a revision id, parsed as UTC
pub const ID_FORMAT: &str = "%Y%m%d%H%M%S";

const ID_LEN: usize = 14;
const TITLE_WIDTH: usize = 72;
const HEADER_OPEN: &str = "/*";
const HEADER_CLOSE: &str = "*/";
const REVISION_KEY: &str = "Revision";
const AUTHOR_KEY: &str = "Author";

/// One ordered, idempotent unit of SQL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Timestamp identifier in the `YYYYMMDDhhmmss` layout
    pub id: String,
    /// Optional path prefix, empty for the root category
    pub category: String,
    /// Who wrote the revision
    pub author: String,
    /// Free text description, the first line doubles as the title
    pub comment: String,
    /// Statements executed when the revision is performed
    pub sql: String,
    /// Only set on revisions read back from the log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performed_at: Option<DateTime<Utc>>,
}

impl Revision {
    /// Create a revision stamped with the current time
    pub fn new(author: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            id: Utc::now().format(ID_FORMAT).to_string(),
            author: author.into(),
            comment: comment.into(),
            ..Default::default()
        }
    }

    /// Create a revision stamped with the current time under a category
    pub fn with_category(
        category: impl Into<String>,
        author: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            ..Self::new(author, comment)
        }
    }

    /// Parse a revision from its text form
    pub fn parse(source: &str) -> RevisionResult<Self> {
        let body = source
            .trim_start()
            .strip_prefix(HEADER_OPEN)
            .ok_or_else(|| RevisionError::MalformedHeader("missing opening /*".to_string()))?;

        let end = body
            .find(HEADER_CLOSE)
            .ok_or_else(|| RevisionError::MalformedHeader("unterminated header block".to_string()))?;

        let header = Header::parse(&body[..end])?;
        let (category, id) = split_slug(&header.slug);
        parse_id(id)?;

        Ok(Self {
            id: id.to_string(),
            category: category.to_string(),
            author: header.author,
            comment: header.comment,
            sql: body[end + HEADER_CLOSE.len()..].trim().to_string(),
            performed_at: None,
        })
    }

    /// Parse a revision from a reader, consuming it to the end
    pub fn from_reader<R: Read>(mut reader: R) -> RevisionResult<Self> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Self::parse(&source)
    }

    /// `category/id`, or the bare id for the root category
    pub fn slug(&self) -> String {
        if self.category.is_empty() {
            self.id.clone()
        } else {
            format!("{}/{}", self.category, self.id)
        }
    }

    /// Short title derived from the comment
    ///
    /// The comment is cut to 72 characters, with `...` appended when that
    /// dropped anything, and then cut again at the first newline.
    pub fn title(&self) -> String {
        let mut title: String = self.comment.chars().take(TITLE_WIDTH).collect();

        if self.comment.chars().count() > TITLE_WIDTH {
            title.push_str("...");
        }

        if let Some(newline) = title.find('\n') {
            title.truncate(newline);
        }
        title
    }

    /// Unix seconds encoded in the id
    pub fn timestamp(&self) -> RevisionResult<i64> {
        Ok(parse_id(&self.id)?.timestamp())
    }

    /// Whether performing this revision would execute anything
    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }
}

impl FromStr for Revision {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", HEADER_OPEN)?;
        writeln!(f, "{}: {}", REVISION_KEY, self.slug())?;
        writeln!(f, "{}:   {}", AUTHOR_KEY, self.author)?;

        if !self.comment.is_empty() {
            write!(f, "\n{}\n", self.comment)?;
        }
        writeln!(f, "{}", HEADER_CLOSE)?;

        if !self.sql.is_empty() {
            write!(f, "\n{}\n", self.sql)?;
        }
        Ok(())
    }
}

/// Parse an id in the fixed timestamp layout
pub fn parse_id(id: &str) -> RevisionResult<DateTime<Utc>> {
    if id.len() != ID_LEN || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RevisionError::InvalidId(id.to_string()));
    }

    // chrono reads a seconds field of 60 as a leap second.
    if &id[12..] > "59" {
        return Err(RevisionError::InvalidId(id.to_string()));
    }

    let naive = NaiveDateTime::parse_from_str(id, ID_FORMAT)
        .map_err(|_| RevisionError::InvalidId(id.to_string()))?;

    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Split a slug into `(category, id)` on its last `/`
pub fn split_slug(slug: &str) -> (&str, &str) {
    slug.rsplit_once('/').unwrap_or(("", slug))
}

/// Fields of the comment block header
struct Header {
    slug: String,
    author: String,
    comment: String,
}

impl Header {
    /// Directive lines first, then a blank separator, then free text
    fn parse(block: &str) -> RevisionResult<Self> {
        let mut slug: Option<String> = None;
        let mut author: Option<String> = None;
        let mut lines = block.lines();

        for line in lines.by_ref() {
            let line = line.trim();

            if line.is_empty() {
                if slug.is_some() && author.is_some() {
                    break;
                }
                continue;
            }

            let (key, value) = line.split_once(':').ok_or_else(|| {
                RevisionError::MalformedHeader(format!("unexpected header line {:?}", line))
            })?;

            let target = match key {
                REVISION_KEY => &mut slug,
                AUTHOR_KEY => &mut author,
                other => {
                    return Err(RevisionError::MalformedHeader(format!(
                        "unknown header directive {:?}",
                        other
                    )))
                }
            };

            if target.is_some() {
                return Err(RevisionError::MalformedHeader(format!(
                    "duplicate {} directive",
                    key
                )));
            }
            *target = Some(value.trim().to_string());
        }

        let slug = slug.ok_or_else(|| {
            RevisionError::MalformedHeader(format!("missing {} directive", REVISION_KEY))
        })?;
        let author = author.ok_or_else(|| {
            RevisionError::MalformedHeader(format!("missing {} directive", AUTHOR_KEY))
        })?;

        let comment = lines.collect::<Vec<_>>().join("\n").trim().to_string();

        Ok(Self {
            slug,
            author,
            comment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_example() {
        let rev = Revision::parse(
            "/*\nRevision: 20060102150405\nAuthor:   A <a@x.com>\n\nAdd users\n*/\nCREATE TABLE users(id INT);",
        )
        .unwrap();

        assert_eq!(rev.id, "20060102150405");
        assert_eq!(rev.category, "");
        assert_eq!(rev.author, "A <a@x.com>");
        assert_eq!(rev.comment, "Add users");
        assert_eq!(rev.sql, "CREATE TABLE users(id INT);");
        assert_eq!(rev.title(), "Add users");
        assert!(rev.performed_at.is_none());
    }

    #[test]
    fn test_parse_multi_paragraph_comment() {
        let source = "/*
Revision: 20060102150405
Author:   Author <me@example.com>

Title

Comment line 1
Comment line 2
*/
DROP TABLE users;";

        let rev: Revision = source.parse().unwrap();

        assert_eq!(rev.comment, "Title\n\nComment line 1\nComment line 2");
        assert_eq!(rev.title(), "Title");
        assert_eq!(rev.sql, "DROP TABLE users;");
    }

    #[test]
    fn test_parse_category() {
        let rev = Revision::parse(
            "/*\nRevision: auth/users/20060102150405\nAuthor: me\n*/\nSELECT 1;",
        )
        .unwrap();

        assert_eq!(rev.category, "auth/users");
        assert_eq!(rev.id, "20060102150405");
        assert_eq!(rev.slug(), "auth/users/20060102150405");
        assert_eq!(rev.comment, "");
    }

    #[test]
    fn test_parse_crlf_and_directive_order() {
        let source = "\r\n/*\r\nAuthor: me\r\nRevision: 20060102150405\r\n\r\nSome comment\r\n*/\r\nSELECT 1;\r\n";
        let rev = Revision::parse(source).unwrap();

        assert_eq!(rev.author, "me");
        assert_eq!(rev.id, "20060102150405");
        assert_eq!(rev.comment, "Some comment");
        assert_eq!(rev.sql, "SELECT 1;");
    }

    #[test]
    fn test_parse_invalid_id() {
        for id in [
            "2006010215040",
            "20061302150405",
            "abcdefghijklmn",
            "",
            "20060102150460",
            "20061231235960",
        ] {
            let source = format!("/*\nRevision: {}\nAuthor: me\n*/\nSELECT 1;", id);
            let err = Revision::parse(&source).unwrap_err();
            assert!(matches!(err, RevisionError::InvalidId(_)), "id {:?} gave {:?}", id, err);
        }
    }

    #[test]
    fn test_parse_malformed_header() {
        let cases = [
            "Revision: 20060102150405\nAuthor: me\nSELECT 1;",
            "/*\nRevision: 20060102150405\nAuthor: me\nSELECT 1;",
            "/*\nAuthor: me\n*/\nSELECT 1;",
            "/*\nRevision: 20060102150405\n*/\nSELECT 1;",
            "/*\nRevision: 20060102150405\nRevision: 20060102150406\nAuthor: me\n*/",
            "/*\nRevision: 20060102150405\nOwner: me\n*/",
            "/*\nRevision: 20060102150405\njust text\n*/",
            "/*\nRevision   : 20060102150405\nAuthor: me\n*/",
            "/*\nRevision: 20060102150405\nAuthor : me\n*/",
        ];

        for source in cases {
            let err = Revision::parse(source).unwrap_err();
            assert!(
                matches!(err, RevisionError::MalformedHeader(_)),
                "{:?} gave {:?}",
                source,
                err
            );
        }
    }

    #[test]
    fn test_round_trip() {
        let revisions = [
            Revision {
                id: "20060102150405".into(),
                category: "billing".into(),
                author: "Jane <jane@example.com>".into(),
                comment: "Add invoices\n\nInvoices reference users.".into(),
                sql: "CREATE TABLE invoices (id INT);\nCREATE INDEX invoices_id ON invoices (id);"
                    .into(),
                performed_at: None,
            },
            Revision {
                id: "20200229235959".into(),
                author: "me".into(),
                ..Default::default()
            },
        ];

        for rev in revisions {
            let parsed = Revision::parse(&rev.to_string()).unwrap();
            assert_eq!(parsed, rev);
        }
    }

    #[test]
    fn test_title() {
        let cases = [
            (
                "A title that is longer than 72 characters in length this should be trimmed with an ellipsis.",
                "A title that is longer than 72 characters in length this should be trimm...",
            ),
            (
                "A comment that will have multiple lines and a long title line\n\nThis is the body of the comment.",
                "A comment that will have multiple lines and a long title line",
            ),
            (
                "A simple comment that is shorter than 72 characters in length",
                "A simple comment that is shorter than 72 characters in length",
            ),
            ("", ""),
        ];

        for (comment, expected) in cases {
            let rev = Revision {
                comment: comment.to_string(),
                ..Default::default()
            };
            assert_eq!(rev.title(), expected);
        }
    }

    #[test]
    fn test_title_counts_characters() {
        let rev = Revision {
            comment: "é".repeat(80),
            ..Default::default()
        };

        assert_eq!(rev.title(), format!("{}...", "é".repeat(72)));
    }

    #[test]
    fn test_new_revision_has_valid_id() {
        let rev = Revision::with_category("auth", "me", "comment");

        assert!(parse_id(&rev.id).is_ok());
        assert_eq!(rev.slug(), format!("auth/{}", rev.id));
        assert!(rev.is_empty());
    }

    #[test]
    fn test_timestamp() {
        let rev = Revision {
            id: "19700101000130".into(),
            ..Default::default()
        };

        assert_eq!(rev.timestamp().unwrap(), 90);
    }

    #[test]
    fn test_from_reader() {
        let source = b"/*\nRevision: 20060102150405\nAuthor: me\n*/\nSELECT 1;";
        let rev = Revision::from_reader(&source[..]).unwrap();

        assert_eq!(rev.sql, "SELECT 1;");
    }
}

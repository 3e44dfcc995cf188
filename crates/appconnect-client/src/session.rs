//! Web session cookies
//!
//! Some App Store Connect data (the Resolution Center) is only served to the
//! website, which authenticates with session cookies instead of API tokens.
//! The session is obtained by an external tool such as `fastlane spaceauth`
//! and handed over as a string in one of two shapes:
//!
//! - a YAML sequence of cookie objects, usually Ruby-tagged:
//!   ```text
//!   ---
//!   - !ruby/object:HTTP::Cookie
//!     name: myacinfo
//!     value: DAWTKNV2...
//!     domain: apple.com
//!   ```
//! - a plain `Cookie` header: `myacinfo=DAWTKNV2...; dqsid=eyJ...`

use std::io::Write;
use std::path::Path;

use serde_yaml::Value as Yaml;
use tracing::debug;

use crate::error::Result;

/// Cookie attributes that can appear when a `Set-Cookie` value is pasted
const COOKIE_ATTRIBUTES: &[&str] = &[
    "path", "domain", "expires", "max-age", "secure", "httponly", "samesite",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// A parsed web session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    cookies: Vec<Cookie>,
}

impl Session {
    /// Parse a session string. Returns `None` when it holds no cookies.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        // Exported shell variables sometimes carry literal "\n" sequences
        let unescaped;
        let raw = if !raw.contains('\n') && raw.contains("\\n") {
            unescaped = raw.replace("\\n", "\n");
            unescaped.as_str()
        } else {
            raw
        };

        let cookies = parse_yaml(raw).unwrap_or_else(|| parse_cookie_header(raw));
        if cookies.is_empty() {
            return None;
        }

        debug!(count = cookies.len(), "parsed web session");
        Some(Self { cookies })
    }

    /// Read a cached session file; a missing file is not an error
    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Write the session as a cookie header, creating parent directories.
    ///
    /// On unix the file is readable by its owner only.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;

        // mode() only applies on creation
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(self.cookie_header().as_bytes())?;
        debug!(path = %path.display(), "saved web session");
        Ok(())
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Value for a `Cookie` request header
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn parse_yaml(raw: &str) -> Option<Vec<Cookie>> {
    let doc: Yaml = serde_yaml::from_str(raw).ok()?;
    let items = doc.as_sequence()?;

    let cookies = items
        .iter()
        .filter_map(|item| {
            let item = match item {
                Yaml::Tagged(tagged) => &tagged.value,
                other => other,
            };
            let name = item.get("name")?.as_str()?;
            let value = match item.get("value")? {
                Yaml::String(s) => s.clone(),
                Yaml::Number(n) => n.to_string(),
                _ => return None,
            };
            Some(Cookie {
                name: name.to_string(),
                value,
            })
        })
        .collect();

    Some(cookies)
}

fn parse_cookie_header(raw: &str) -> Vec<Cookie> {
    raw.split([';', '\n'])
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() || COOKIE_ATTRIBUTES.contains(&name.to_ascii_lowercase().as_str()) {
                return None;
            }
            Some(Cookie {
                name: name.to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const YAML_SESSION: &str = "---
- !ruby/object:HTTP::Cookie
  name: myacinfo
  value: DAWTKNV2abc
  domain: apple.com
  for_domain: true
  path: \"/\"
  secure: true
  httponly: true
- !ruby/object:HTTP::Cookie
  name: dqsid
  value: eyJhbGciOi
  domain: appstoreconnect.apple.com
  path: \"/\"
";

    #[test]
    fn test_parse_yaml_session() {
        let session = Session::parse(YAML_SESSION).unwrap();
        assert_eq!(session.cookies().len(), 2);
        assert_eq!(session.cookie_header(), "myacinfo=DAWTKNV2abc; dqsid=eyJhbGciOi");
    }

    #[test]
    fn test_parse_untagged_yaml() {
        let session = Session::parse("- name: a\n  value: '1'\n- name: b\n  value: 2\n").unwrap();
        assert_eq!(session.cookie_header(), "a=1; b=2");
    }

    #[test]
    fn test_parse_escaped_newlines() {
        let escaped = YAML_SESSION.replace('\n', "\\n");
        let session = Session::parse(&escaped).unwrap();
        assert_eq!(session.cookie_header(), "myacinfo=DAWTKNV2abc; dqsid=eyJhbGciOi");
    }

    #[test]
    fn test_both_formats_agree() {
        let from_yaml = Session::parse(YAML_SESSION).unwrap();
        let from_header = Session::parse("myacinfo=DAWTKNV2abc; dqsid=eyJhbGciOi").unwrap();
        assert_eq!(from_yaml, from_header);
    }

    #[test]
    fn test_cookie_header_skips_attributes() {
        let session = Session::parse("myacinfo=abc==; Path=/; Domain=apple.com; Secure; HttpOnly").unwrap();
        assert_eq!(session.cookies().len(), 1);
        assert_eq!(session.cookie_header(), "myacinfo=abc==");
    }

    #[test]
    fn test_empty_session() {
        assert!(Session::parse("").is_none());
        assert!(Session::parse("   ").is_none());
        assert!(Session::parse("no cookies here").is_none());
        assert!(Session::parse("---\n[]\n").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("session");

        let session = Session::parse(YAML_SESSION).unwrap();
        session.save(&path).unwrap();

        assert_eq!(Session::from_file(&path).unwrap(), Some(session));
        assert_eq!(Session::from_file(&temp.path().join("absent")).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_session_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session");
        std::fs::write(&path, "stale").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        Session::parse("myacinfo=secret").unwrap().save(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "myacinfo=secret");
    }
}

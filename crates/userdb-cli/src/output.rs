//! JSON-lines rendering of lookup results.

use std::io::Write;

use serde::Serialize;

use crate::errors::AppError;

/// Group ids of one user, as printed by `userdb groups`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct GroupIds<'a> {
    pub(crate) user: &'a str,
    pub(crate) gids: Vec<String>,
}

/// Writes `value` as one compact JSON object followed by a newline.
pub(crate) fn write_json_line<W, T>(stdout: &mut W, value: &T) -> Result<(), AppError>
where
    W: Write,
    T: Serialize + ?Sized,
{
    serde_json::to_writer(&mut *stdout, value)?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use userdb_client::{Group, User};

    #[test]
    fn renders_group_as_one_line() {
        let group = Group {
            name: "adm".to_owned(),
            gid: "4".to_owned(),
        };
        let mut buffer = Vec::new();
        write_json_line(&mut buffer, &group).expect("group renders");
        assert_eq!(buffer, b"{\"name\":\"adm\",\"gid\":\"4\"}\n");
    }

    #[test]
    fn renders_user_fields() {
        let user = User {
            uid: "1000".to_owned(),
            gid: "1000".to_owned(),
            username: "alice".to_owned(),
            name: "Alice".to_owned(),
            home_dir: "/home/alice".to_owned(),
            shell: "/bin/sh".to_owned(),
        };
        let mut buffer = Vec::new();
        write_json_line(&mut buffer, &user).expect("user renders");
        let value: serde_json::Value = serde_json::from_slice(&buffer).expect("valid JSON");
        assert_eq!(value["username"], "alice");
        assert_eq!(value["home_dir"], "/home/alice");
        assert_eq!(value["uid"], "1000");
    }

    #[test]
    fn renders_group_ids() {
        let ids = GroupIds {
            user: "alice",
            gids: vec!["100".to_owned(), "1000".to_owned()],
        };
        let mut buffer = Vec::new();
        write_json_line(&mut buffer, &ids).expect("ids render");
        assert_eq!(buffer, b"{\"user\":\"alice\",\"gids\":[\"100\",\"1000\"]}\n");
    }
}

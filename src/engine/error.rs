#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command failed: {command}")]
    CommandFailed { command: String, status: Option<i32> },
    #[error("failed to parse output of `{command}`: {source}")]
    InspectParse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{command}` returned no entries")]
    EmptyInspect { command: String },
    #[error("failed to pull {} of {total} images: {}", .failures.len(), describe_pull_failures(.failures))]
    Pull {
        total: usize,
        /// Every failed repo tag with its underlying error; completed pulls
        /// are not rolled back.
        failures: Vec<(String, Box<Error>)>,
    },
}

fn describe_pull_failures(failures: &[(String, Box<Error>)]) -> String {
    failures
        .iter()
        .map(|(tag, err)| format!("`{tag}`: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_error_names_each_failed_tag() {
        let err = Error::Pull {
            total: 3,
            failures: vec![
                (
                    "minipaas/hello:latest".to_owned(),
                    Box::new(Error::CommandFailed {
                        command: "docker pull minipaas/hello:latest".to_owned(),
                        status: Some(1),
                    }),
                ),
                (
                    "minipaas/increment:1.0".to_owned(),
                    Box::new(Error::CommandFailed {
                        command: "docker pull minipaas/increment:1.0".to_owned(),
                        status: Some(1),
                    }),
                ),
            ],
        };

        let message = err.to_string();
        assert!(message.contains("2 of 3"));
        assert!(message.contains("`minipaas/hello:latest`: command failed"));
        assert!(message.contains("`minipaas/increment:1.0`"));
    }
}

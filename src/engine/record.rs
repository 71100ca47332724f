//! Value records produced by the engine client, and the parsers that build
//! them from raw `docker` output.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// One row from the engine's image table.
///
/// An immutable snapshot, re-fetched on every inventory pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub repository: String,
    pub tag: String,
    /// Derived `repository:tag`.
    pub repo_tag: String,
    /// Content digest, untruncated.
    pub id: String,
}

/// One container's inspected runtime state.
///
/// `image_id` is a non-owning back-reference to the image the container was
/// created from. Records are discarded after each correlation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub id: String,
    pub image_id: String,
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
}

/// Join product handed from the engine client to the correlation engine: an
/// image, its declared environment, and the matched container if one runs
/// from this image id.
#[derive(Debug, Clone)]
pub struct InspectedImage {
    pub image: ImageRecord,
    pub env: HashMap<String, String>,
    pub container: Option<ContainerRecord>,
}

/// Parses the tabular output of `docker images --no-trunc`.
///
/// The column-header line (first field `REPOSITORY`) and blank lines are
/// skipped; rows with fewer than three columns are logged and dropped. Keys
/// are unique by construction (`repository:tag`).
pub fn parse_images(output: &str) -> HashMap<String, ImageRecord> {
    let mut images = HashMap::new();

    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let Some(repository) = parts.next() else {
            continue;
        };
        if repository == "REPOSITORY" {
            continue;
        }

        let (Some(tag), Some(id)) = (parts.next(), parts.next()) else {
            log::warn!("skipping malformed image table row: `{line}`");
            continue;
        };

        let record = ImageRecord {
            repository: repository.to_owned(),
            tag: tag.to_owned(),
            repo_tag: format!("{repository}:{tag}"),
            id: id.to_owned(),
        };
        images.insert(record.repo_tag.clone(), record);
    }

    images
}

/// Splits `KEY=VALUE` environment strings into a map.
///
/// Entries without `=` map to an empty value.
pub fn parse_env(env: &[String]) -> HashMap<String, String> {
    env.iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => (key.to_owned(), value.to_owned()),
            None => (entry.clone(), String::new()),
        })
        .collect()
}

/// Appends the default `latest` tag to every filter that names no tag.
pub fn normalize_repo_tags(repo_tags: &[String]) -> Vec<String> {
    repo_tags
        .iter()
        .map(|tag| {
            if tag.contains(':') {
                tag.clone()
            } else {
                format!("{tag}:latest")
            }
        })
        .collect()
}

/// Selects the images matching the given normalized `repository:tag` filters.
///
/// An empty filter list retains every image; a non-matching filter retains
/// nothing.
pub fn filter_images(
    images: HashMap<String, ImageRecord>,
    repo_tags: &[String],
) -> Vec<ImageRecord> {
    if repo_tags.is_empty() {
        return images.into_values().collect();
    }

    let mut images = images;
    repo_tags
        .iter()
        .filter_map(|tag| images.remove(tag))
        .collect()
}

/// Joins each selected image with its declared environment and the container
/// running from its image id, if any.
///
/// `envs` is positionally aligned with `images`; images without a matching
/// container join with `None`.
pub fn join_containers(
    images: Vec<ImageRecord>,
    envs: Vec<HashMap<String, String>>,
    containers: &HashMap<String, ContainerRecord>,
) -> Vec<InspectedImage> {
    images
        .into_iter()
        .zip(envs)
        .map(|(image, env)| InspectedImage {
            container: containers.get(&image.id).cloned(),
            image,
            env,
        })
        .collect()
}

/// Keys container records by the image id they were started from.
///
/// If two containers share an image id, the later one in listing order
/// overwrites the earlier. Last-wins is the accepted tradeoff of the
/// one-container-per-image assumption, not an oversight.
pub fn key_by_image(
    records: impl IntoIterator<Item = ContainerRecord>,
) -> HashMap<String, ContainerRecord> {
    records
        .into_iter()
        .map(|record| (record.image_id.clone(), record))
        .collect()
}

/// One element of the JSON array printed by `docker inspect <id>`.
///
/// The same shape serves both image inspection (`Config.Env`) and container
/// inspection (`Image`, `State`); fields missing from the other kind default.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct InspectEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub config: Option<InspectConfig>,
    #[serde(default)]
    pub state: Option<InspectState>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct InspectConfig {
    #[serde(default)]
    pub env: Option<Vec<String>>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct InspectState {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub started_at: Option<String>,
}

impl InspectEntry {
    pub(crate) fn into_container_record(self) -> ContainerRecord {
        let state = self.state.unwrap_or_default();
        let started_at = state
            .started_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        ContainerRecord {
            id: self.id,
            image_id: self.image,
            running: state.running,
            started_at,
        }
    }

    pub(crate) fn into_env(self) -> HashMap<String, String> {
        let env = self
            .config
            .and_then(|config| config.env)
            .unwrap_or_default();
        parse_env(&env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE_TABLE: &str = "\
REPOSITORY            TAG       IMAGE ID                                                                  CREATED       SIZE
minipaas/hello        latest    sha256:6950f04ee720641dd7c0215cce762f64c2b2649d51aa86fc242da8ed301b9110   2 weeks ago   200MB

minipaas/increment    1.0       sha256:e555080d282b0d2a79cb0ba3fdd56c629e6e250a2fb6fd6fefb56b484e873cc0   3 weeks ago   150MB
";

    #[test]
    fn test_parse_images_skips_header_and_blank_lines() {
        let images = parse_images(IMAGE_TABLE);
        assert_eq!(images.len(), 2);

        let hello = &images["minipaas/hello:latest"];
        assert_eq!(hello.repository, "minipaas/hello");
        assert_eq!(hello.tag, "latest");
        assert_eq!(
            hello.id,
            "sha256:6950f04ee720641dd7c0215cce762f64c2b2649d51aa86fc242da8ed301b9110"
        );

        assert!(images.contains_key("minipaas/increment:1.0"));
    }

    #[test]
    fn test_parse_images_drops_malformed_rows() {
        let images = parse_images("minipaas/hello latest\n");
        assert!(images.is_empty());
    }

    #[test]
    fn test_parse_env() {
        let env = parse_env(&[
            "PATH=/usr/bin:/bin".to_owned(),
            "minipaas_version=1".to_owned(),
            "MARKER".to_owned(),
        ]);
        assert_eq!(env["PATH"], "/usr/bin:/bin");
        assert_eq!(env["minipaas_version"], "1");
        assert_eq!(env["MARKER"], "");
    }

    #[test]
    fn test_normalize_repo_tags_appends_latest() {
        let normalized = normalize_repo_tags(&[
            "minipaas/hello".to_owned(),
            "minipaas/increment:1.0".to_owned(),
        ]);
        assert_eq!(
            normalized,
            vec![
                "minipaas/hello:latest".to_owned(),
                "minipaas/increment:1.0".to_owned()
            ]
        );
    }

    #[test]
    fn test_filter_images() {
        let images = parse_images(IMAGE_TABLE);

        let all = filter_images(images.clone(), &[]);
        assert_eq!(all.len(), 2);

        let none = filter_images(images.clone(), &["other/image:latest".to_owned()]);
        assert!(none.is_empty());

        let one = filter_images(images, &["minipaas/hello:latest".to_owned()]);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].repo_tag, "minipaas/hello:latest");
    }

    #[test]
    fn test_join_containers_matches_by_image_id() {
        let images = vec![
            ImageRecord {
                repository: "minipaas/hello".to_owned(),
                tag: "latest".to_owned(),
                repo_tag: "minipaas/hello:latest".to_owned(),
                id: "img-hello".to_owned(),
            },
            ImageRecord {
                repository: "minipaas/increment".to_owned(),
                tag: "1.0".to_owned(),
                repo_tag: "minipaas/increment:1.0".to_owned(),
                id: "img-increment".to_owned(),
            },
        ];
        let envs = vec![
            HashMap::from([("minipaas_version".to_owned(), "1".to_owned())]),
            HashMap::new(),
        ];
        let container = ContainerRecord {
            id: "c0ffee".to_owned(),
            image_id: "img-hello".to_owned(),
            running: true,
            started_at: None,
        };
        let containers = key_by_image([container.clone()]);

        let joined = join_containers(images, envs, &containers);
        assert_eq!(joined.len(), 2);

        assert_eq!(joined[0].image.repo_tag, "minipaas/hello:latest");
        assert_eq!(joined[0].container.as_ref(), Some(&container));
        assert_eq!(joined[0].env["minipaas_version"], "1");

        assert_eq!(joined[1].image.repo_tag, "minipaas/increment:1.0");
        assert!(joined[1].container.is_none());
        assert!(joined[1].env.is_empty());
    }

    #[test]
    fn test_key_by_image_last_wins() {
        let older = ContainerRecord {
            id: "c1".to_owned(),
            image_id: "img".to_owned(),
            running: true,
            started_at: None,
        };
        let newer = ContainerRecord {
            id: "c2".to_owned(),
            image_id: "img".to_owned(),
            running: true,
            started_at: None,
        };

        let keyed = key_by_image([older, newer]);
        assert_eq!(keyed.len(), 1);
        assert_eq!(keyed["img"].id, "c2");
    }

    #[test]
    fn test_inspect_entry_into_container_record() {
        let raw = r#"[{
            "Id": "c0ffee",
            "Image": "sha256:6950f0",
            "State": {
                "Running": true,
                "StartedAt": "2015-01-06T15:47:32.080254511Z"
            },
            "Config": { "Env": [ "minipaas_version=1" ] }
        }]"#;
        let mut entries: Vec<InspectEntry> = serde_json::from_str(raw).unwrap();
        let record = entries.pop().unwrap().into_container_record();

        assert_eq!(record.id, "c0ffee");
        assert_eq!(record.image_id, "sha256:6950f0");
        assert!(record.running);
        let started_at = record.started_at.unwrap();
        assert_eq!(started_at.timestamp(), 1420559252);
    }

    #[test]
    fn test_inspect_entry_into_env() {
        let raw = r#"[{ "Id": "i", "Config": { "Env": [ "minipaas_version=1" ] } }]"#;
        let mut entries: Vec<InspectEntry> = serde_json::from_str(raw).unwrap();
        let env = entries.pop().unwrap().into_env();
        assert_eq!(env["minipaas_version"], "1");
    }
}

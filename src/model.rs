// Index model: identifiers read from the remote indexes and the URLs built from them

use std::fmt;
use std::path::PathBuf;

use crate::constants;
use crate::error::{Error, Result};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

identifier!(
    /// Dotted group identifier, e.g. `androidx.activity`.
    NamespaceId
);
identifier!(ArtifactId);
identifier!(VersionTag);
identifier!(
    /// Packaging of an artifact, which doubles as its file extension.
    FileTypeTag
);

impl NamespaceId {
    /// Dots become path segments: `com.example` -> `com/example`.
    pub fn path(&self) -> String {
        self.0.replace('.', "/")
    }

    pub fn index_url(&self, base: &RepositoryUrl) -> String {
        base.join(&format!("{}/{}", self.path(), constants::GROUP_INDEX_FILE))
    }

    pub fn matches_any(&self, prefixes: &[String]) -> bool {
        prefixes.is_empty() || prefixes.iter().any(|p| self.0.starts_with(p.as_str()))
    }
}

impl Default for FileTypeTag {
    fn default() -> Self {
        Self::new(constants::DEFAULT_FILE_TYPE)
    }
}

/// An artifact family, independent of version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub namespace: NamespaceId,
    pub artifact: ArtifactId,
}

impl Coordinate {
    pub fn new(namespace: NamespaceId, artifact: ArtifactId) -> Self {
        Self {
            namespace,
            artifact,
        }
    }

    /// Pin the coordinate to a version; the file type starts out as the default.
    pub fn at(&self, version: VersionTag) -> ResolvedArtifact {
        ResolvedArtifact {
            namespace: self.namespace.clone(),
            artifact: self.artifact.clone(),
            version,
            file_type: FileTypeTag::default(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.artifact)
    }
}

/// A downloadable unit: namespace, artifact, version and file type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedArtifact {
    pub namespace: NamespaceId,
    pub artifact: ArtifactId,
    pub version: VersionTag,
    pub file_type: FileTypeTag,
}

impl ResolvedArtifact {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.namespace.clone(), self.artifact.clone())
    }

    pub fn with_file_type(self, file_type: FileTypeTag) -> Self {
        Self { file_type, ..self }
    }

    /// `com/example/artifact/1.0`, shared by the remote layout and the output tree.
    pub fn directory_path(&self) -> String {
        format!("{}/{}/{}", self.namespace.path(), self.artifact, self.version)
    }

    pub fn output_dir(&self) -> PathBuf {
        let mut dir: PathBuf = self.namespace.as_str().split('.').collect();
        dir.push(self.artifact.as_str());
        dir.push(self.version.as_str());
        dir
    }

    fn file_name(&self, extension: &str) -> String {
        format!("{}-{}.{}", self.artifact, self.version, extension)
    }

    pub fn binary_file_name(&self) -> String {
        self.file_name(self.file_type.as_str())
    }

    pub fn directory_url(&self, base: &RepositoryUrl) -> String {
        base.join(&format!("{}/", self.directory_path()))
    }

    pub fn pom_url(&self, base: &RepositoryUrl) -> String {
        base.join(&format!(
            "{}/{}",
            self.directory_path(),
            self.file_name(constants::POM_EXTENSION)
        ))
    }

    pub fn binary_url(&self, base: &RepositoryUrl) -> String {
        base.join(&format!(
            "{}/{}",
            self.directory_path(),
            self.binary_file_name()
        ))
    }
}

impl fmt::Display for ResolvedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.namespace, self.artifact, self.version, self.file_type
        )
    }
}

/// Base URL of the mirrored repository, always ending in `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryUrl(String);

impl RepositoryUrl {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut base = raw.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let url = reqwest::Url::parse(&base)
            .map_err(|e| Error::Config(format!("invalid base URL '{}': {}", raw, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config(format!(
                "base URL '{}' must use http or https",
                raw
            )));
        }

        Ok(Self(base))
    }

    pub fn join(&self, relative: &str) -> String {
        format!("{}{}", self.0, relative.trim_start_matches('/'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RepositoryUrl {
        RepositoryUrl::parse("https://repo.example.com/maven2").unwrap()
    }

    fn artifact(namespace: &str, artifact: &str, version: &str, file_type: &str) -> ResolvedArtifact {
        Coordinate::new(namespace.into(), artifact.into())
            .at(version.into())
            .with_file_type(file_type.into())
    }

    #[test]
    fn test_binary_url_uses_namespace_path() {
        let artifact = artifact("com.example.foo", "bar", "1.2.3", "aar");
        let url = artifact.binary_url(&base());
        assert!(
            url.ends_with("com/example/foo/bar/1.2.3/bar-1.2.3.aar"),
            "unexpected url {}",
            url
        );
        assert_eq!(
            url,
            "https://repo.example.com/maven2/com/example/foo/bar/1.2.3/bar-1.2.3.aar"
        );
    }

    #[test]
    fn test_pom_and_directory_urls() {
        let artifact = artifact("com.example", "bar", "2.0", "jar");
        assert_eq!(
            artifact.pom_url(&base()),
            "https://repo.example.com/maven2/com/example/bar/2.0/bar-2.0.pom"
        );
        assert_eq!(
            artifact.directory_url(&base()),
            "https://repo.example.com/maven2/com/example/bar/2.0/"
        );
    }

    #[test]
    fn test_namespace_index_url() {
        let namespace = NamespaceId::new("androidx.activity");
        assert_eq!(
            namespace.index_url(&base()),
            "https://repo.example.com/maven2/androidx/activity/group-index.xml"
        );
    }

    #[test]
    fn test_coordinate_defaults_to_jar() {
        let resolved = Coordinate::new("com.example".into(), "foo".into()).at("1.0".into());
        assert_eq!(resolved.file_type, FileTypeTag::new("jar"));
        assert_eq!(resolved.to_string(), "com.example:foo:1.0:jar");
        assert_eq!(resolved.coordinate().to_string(), "com.example:foo");
    }

    #[test]
    fn test_with_file_type_keeps_identity() {
        let jar = artifact("com.example", "foo", "1.0", "jar");
        let aar = jar.clone().with_file_type("aar".into());
        assert_eq!(jar.coordinate(), aar.coordinate());
        assert_eq!(jar.version, aar.version);
        assert_eq!(aar.binary_file_name(), "foo-1.0.aar");
    }

    #[test]
    fn test_output_dir_mirrors_remote_layout() {
        let artifact = artifact("com.example.foo", "bar", "1.2.3", "aar");
        assert_eq!(
            artifact.output_dir(),
            PathBuf::from("com").join("example").join("foo").join("bar").join("1.2.3")
        );
    }

    #[test]
    fn test_namespace_prefix_filter() {
        let namespace = NamespaceId::new("androidx.core");
        assert!(namespace.matches_any(&[]));
        assert!(namespace.matches_any(&["androidx.".to_string()]));
        assert!(!namespace.matches_any(&["com.google.".to_string()]));
    }

    #[test]
    fn test_repository_url_rejects_non_http() {
        assert!(RepositoryUrl::parse("ftp://repo.example.com/").is_err());
        assert!(RepositoryUrl::parse("not a url").is_err());
        assert_eq!(
            RepositoryUrl::parse("http://localhost:8080").unwrap().as_str(),
            "http://localhost:8080/"
        );
    }
}

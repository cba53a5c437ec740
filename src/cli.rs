use std::path::{Component, Path, PathBuf};

use structopt::StructOpt;

/// Command-line arguments for the Go LSIF indexer.
#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "lsif-go", about = "An LSIF indexer for Go workspaces")]
pub struct Args {
    /// Path to the root of the Go module, or the current directory if not present.
    #[structopt(parse(from_os_str))]
    pub project_root: Option<PathBuf>,
    /// The output file, `dump.lsif` if not present.
    #[structopt(short, long, parse(from_os_str))]
    pub output: Option<PathBuf>,
    /// Path to a TOML config file overriding the embedded defaults.
    #[structopt(short, long, parse(from_os_str))]
    pub config: Option<PathBuf>,
    /// Overrides the toolchain language version used for the stdlib's
    /// synthetic dependency version (e.g. "1.21").
    #[structopt(long)]
    pub language_version: Option<String>,
    /// Number of worker threads per pass. Defaults to the number of cores.
    #[structopt(short, long)]
    pub jobs: Option<usize>,
}

impl Args {
    pub fn canonicalize_paths(&mut self) {
        self.project_root = Some(
            self.project_root
                .clone()
                .unwrap_or_else(|| PathBuf::from("."))
                .canonicalize()
                .unwrap(),
        );
        self.output = Some(self.output.as_ref().map_or(
            normalize_path(&self.project_root.clone().unwrap().join("dump.lsif")),
            |p| normalize_path(p),
        ));
    }
}

/// Same as `std::path::Path::canonicalize`, but does not require that the given path exists.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = path.components().peekable();
    let mut ret = if let Some(c @ Component::Prefix(..)) = components.peek().cloned() {
        components.next();
        PathBuf::from(c.as_os_str())
    } else {
        PathBuf::new()
    };

    for component in components {
        match component {
            Component::Prefix(..) => unreachable!(),
            Component::RootDir => {
                ret.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                ret.pop();
            }
            Component::Normal(c) => {
                ret.push(c);
            }
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_collapses_parent_dir_components() {
        let p = normalize_path(Path::new("/a/b/../c"));
        assert_eq!(p, PathBuf::from("/a/c"));
    }
}

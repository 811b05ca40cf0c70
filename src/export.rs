/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Mirror a partition into a directory tree of symlinks.
//!
//! ```text
//! root/
//!   cluster_with_2/
//!     cluster_0/  a.jpg -> /abs/path/a.jpg, b.jpg -> ...
//!   cluster_with_3/
//!     cluster_0/  ...
//!     cluster_1/  ...
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::partition::Partition;

/// Directory a cluster is exported to, relative to the export root.
pub fn cluster_dir(root: &Path, size: usize, index_in_size: usize) -> PathBuf {
    root.join(std::format!("cluster_with_{}", size))
        .join(std::format!("cluster_{}", index_in_size))
}

/// Recreate `root` with one symlink per clustered image.
///
/// Anything already at `root` is removed first. Image identifiers are taken
/// as file paths; links point at their absolute form and are named after the
/// file name.
#[cfg(unix)]
pub fn make_links(partition: &Partition, root: &Path) -> io::Result<()> {
    info!("cluster dir: {}", root.display());
    if root.exists() {
        fs::remove_dir_all(root)?;
    }
    for cluster in partition.iter_ordered() {
        let dir = cluster_dir(root, cluster.size, cluster.index_in_size);
        fs::create_dir_all(&dir)?;
        for id in cluster.members {
            let src = Path::new(id);
            let name = src.file_name().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    std::format!("image id '{}' has no file name", id),
                )
            })?;
            let target = if src.is_absolute() {
                src.to_path_buf()
            } else {
                std::env::current_dir()?.join(src)
            };
            std::os::unix::fs::symlink(target, dir.join(name))?;
        }
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(std::format!(
            "imagecluster-export-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_links_mirror_partition() {
        let base = scratch("mirror");
        let src = base.join("src");
        fs::create_dir_all(&src).unwrap();
        let mut names = std::vec::Vec::new();
        for n in ["a.png", "b.png", "c.png"] {
            let p = src.join(n);
            fs::write(&p, b"x").unwrap();
            names.push(p.to_string_lossy().into_owned());
        }
        let partition = Partition::from_clusters(std::vec![
            std::vec![names[0].clone(), names[1].clone()],
            std::vec![names[2].clone()],
        ]);

        let root = base.join("clusters");
        fs::create_dir_all(root.join("stale")).unwrap();
        make_links(&partition, &root).unwrap();

        assert!(!root.join("stale").exists());
        let link = cluster_dir(&root, 2, 0).join("b.png");
        assert_eq!(fs::read_link(&link).unwrap(), src.join("b.png"));
        assert!(cluster_dir(&root, 1, 0).join("c.png").exists());

        fs::remove_dir_all(&base).unwrap();
    }
}

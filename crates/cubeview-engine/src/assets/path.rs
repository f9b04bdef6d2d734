use std::path::{Path, PathBuf};

/// Resolves an asset URL against `root`.
///
/// Site-absolute (`/assets/x.png`) and relative (`./assets/x.png`) URLs both
/// resolve below `root`. Empty segments and `.` are dropped; `..` pops.
pub fn resolve_url(root: &Path, url: &str) -> PathBuf {
    let mut out = root.to_path_buf();
    let mut depth = 0usize;
    for segment in url.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                }
            }
            s => {
                out.push(s);
                depth += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_slash_and_dot_resolve_below_root() {
        let root = Path::new("/srv/viewer");
        assert_eq!(
            resolve_url(root, "/assets/texture.jpg"),
            PathBuf::from("/srv/viewer/assets/texture.jpg")
        );
        assert_eq!(
            resolve_url(root, "./assets/stair.gltf"),
            PathBuf::from("/srv/viewer/assets/stair.gltf")
        );
    }

    #[test]
    fn parent_segments_stay_inside_root() {
        let root = Path::new("/srv/viewer");
        assert_eq!(
            resolve_url(root, "assets/../../../etc/passwd"),
            PathBuf::from("/srv/viewer/etc/passwd")
        );
    }
}

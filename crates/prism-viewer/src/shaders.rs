use std::borrow::Cow;
use std::path::{Path, PathBuf};

pub const LIT: &str = "lit";
pub const MARKER: &str = "marker";

const EMBEDDED: &[(&str, &str)] = &[
    (LIT, include_str!("../shaders/lit.wgsl")),
    (MARKER, include_str!("../shaders/marker.wgsl")),
];

/// Where a shader's text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderOrigin {
    Disk(PathBuf),
    Embedded,
}

/// WGSL source text for one program.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub name: String,
    pub code: Cow<'static, str>,
    pub origin: ShaderOrigin,
}

impl ShaderSource {
    /// Reads `<dir>/<name>.wgsl`, falling back to the built-in copy.
    ///
    /// Returns `None` only for a name with neither a readable file nor a
    /// built-in copy.
    pub fn load(dir: &Path, name: &str) -> Option<Self> {
        let path = shader_path(dir, name);
        match std::fs::read_to_string(&path) {
            Ok(code) => Some(Self {
                name: name.to_string(),
                code: Cow::Owned(code),
                origin: ShaderOrigin::Disk(path),
            }),
            Err(e) => {
                let src = Self::builtin(name)?;
                log::warn!("cannot read shader {}: {e}; using built-in `{name}`", path.display());
                Some(src)
            }
        }
    }

    /// The copy compiled into the binary, ignoring any file on disk.
    pub fn builtin(name: &str) -> Option<Self> {
        embedded(name).map(|code| Self {
            name: name.to_string(),
            code: Cow::Borrowed(code),
            origin: ShaderOrigin::Embedded,
        })
    }

    pub fn module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.name.as_str()),
            source: wgpu::ShaderSource::Wgsl(self.code.clone()),
        })
    }
}

pub fn shader_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.wgsl"))
}

fn embedded(name: &str) -> Option<&'static str> {
    EMBEDDED.iter().find(|(n, _)| *n == name).map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("prism-shaders-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_dir_falls_back_to_embedded() {
        let src = ShaderSource::load(Path::new("/no/such/dir"), LIT).unwrap();
        assert_eq!(src.origin, ShaderOrigin::Embedded);
        assert!(src.code.contains("fs_main"));
    }

    #[test]
    fn file_on_disk_wins() {
        let dir = scratch_dir("disk");
        std::fs::write(shader_path(&dir, MARKER), "// custom").unwrap();

        let src = ShaderSource::load(&dir, MARKER).unwrap();
        assert_eq!(src.origin, ShaderOrigin::Disk(dir.join("marker.wgsl")));
        assert_eq!(src.code, "// custom");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn builtin_ignores_broken_file_on_disk() {
        let dir = scratch_dir("broken");
        std::fs::write(shader_path(&dir, LIT), "fn vs_main( {").unwrap();

        assert_eq!(ShaderSource::load(&dir, LIT).unwrap().origin, ShaderOrigin::Disk(dir.join("lit.wgsl")));
        let src = ShaderSource::builtin(LIT).unwrap();
        assert_eq!(src.origin, ShaderOrigin::Embedded);
        assert!(src.code.contains("fs_main"));
        assert!(ShaderSource::builtin("bloom").is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unknown_name_without_file_is_none() {
        assert!(ShaderSource::load(Path::new("/no/such/dir"), "bloom").is_none());
    }

    #[test]
    fn shipped_files_match_embedded_copies() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders");
        for (name, code) in EMBEDDED {
            let src = ShaderSource::load(&dir, name).unwrap();
            assert_eq!(src.code, *code);
        }
    }
}

// Source loading
// Turns a `.vm` file or a directory of them into ordered translation units

use crate::vm_translator::error::TranslatorError;
use crate::vm_translator::TranslationUnit;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

const VM_EXTENSION: &str = "vm";
const ASM_EXTENSION: &str = "asm";

/// The units found at an input path plus where their translation belongs
#[derive(Debug)]
pub struct SourceSet {
    pub units: Vec<TranslationUnit>,
    pub output_path: PathBuf,
    /// Directory inputs are whole programs and get a bootstrap by default
    pub is_program_directory: bool,
}

impl SourceSet {
    /// Load `path`; for directories, `first_unit` is moved to the front when present
    pub fn load(path: &Path, first_unit: &str) -> Result<Self, TranslatorError> {
        if path.is_dir() {
            Self::load_directory(path, first_unit)
        } else {
            Self::load_file(path)
        }
    }

    fn load_file(path: &Path) -> Result<Self, TranslatorError> {
        if !has_vm_extension(path) {
            return Err(TranslatorError::Io(format!(
                "input file '{}' must have a .{} extension",
                path.display(),
                VM_EXTENSION
            )));
        }
        if !path.exists() {
            return Err(TranslatorError::Io(format!(
                "file '{}' not found",
                path.display()
            )));
        }

        let unit = read_unit(path)?;
        Ok(SourceSet {
            units: vec![unit],
            output_path: path.with_extension(ASM_EXTENSION),
            is_program_directory: false,
        })
    }

    fn load_directory(dir: &Path, first_unit: &str) -> Result<Self, TranslatorError> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_vm_extension(p))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(TranslatorError::Io(format!(
                "no .{} files found in directory '{}'",
                VM_EXTENSION,
                dir.display()
            )));
        }

        let mut units = files
            .iter()
            .map(|p| read_unit(p))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(pos) = units.iter().position(|u| u.namespace == first_unit) {
            let unit = units.remove(pos);
            units.insert(0, unit);
        }

        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .or_else(|| {
                dir.canonicalize()
                    .ok()
                    .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            })
            .unwrap_or_else(|| "out".to_string());
        let output_path = dir.join(format!("{}.{}", dir_name, ASM_EXTENSION));

        info!(
            "Found {} units in {}: {}",
            units.len(),
            dir.display(),
            units
                .iter()
                .map(|u| u.namespace.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(SourceSet {
            units,
            output_path,
            is_program_directory: true,
        })
    }
}

fn has_vm_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == VM_EXTENSION)
}

fn read_unit(path: &Path) -> Result<TranslationUnit, TranslatorError> {
    let namespace = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| TranslatorError::Io(format!("invalid file name '{}'", path.display())))?;
    let source = fs::read_to_string(path)
        .map_err(|err| TranslatorError::Io(format!("cannot read '{}': {}", path.display(), err)))?;
    debug!("Read {} ({} bytes)", path.display(), source.len());
    Ok(TranslationUnit::new(&namespace, source))
}

//! Function-name prefixes and include-guard derivation.

use std::path::Path;

use crate::EmitError;

/// Apply the optional naming prefix to a generated function name.
///
/// `prefixed(Some("moz"), "opcode_size")` is `moz_opcode_size`; a prefix that
/// already ends in `_` is used as is.
pub fn prefixed(prefix: Option<&str>, name: &str) -> Result<String, EmitError> {
    match prefix {
        None | Some("") => Ok(name.to_string()),
        Some(p) if !vmgen_schema::is_identifier(p) => Err(EmitError::InvalidPrefix(p.to_string())),
        Some(p) if p.ends_with('_') => Ok(format!("{p}{name}")),
        Some(p) => Ok(format!("{p}_{name}")),
    }
}

/// Derive the include guard for a generated header.
///
/// The guard is the upper-cased file name of `path` with every character
/// that cannot appear in an identifier replaced by `_`, preceded by the
/// upper-cased prefix when one is given: `src/vm_inst.h` with prefix `moz`
/// becomes `MOZ_VM_INST_H`. Only the file name is used so the guard does not
/// depend on where the build tree lives.
pub fn include_guard(path: &Path, prefix: Option<&str>) -> Result<String, EmitError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| EmitError::InvalidGuardSeed(path.display().to_string()))?;

    let stem: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();

    let guard = match prefix {
        None | Some("") => stem,
        Some(p) if !vmgen_schema::is_identifier(p) => {
            return Err(EmitError::InvalidPrefix(p.to_string()));
        }
        Some(p) => format!("{}_{}", p.trim_end_matches('_').to_ascii_uppercase(), stem),
    };

    // Cannot start with digit
    if guard.starts_with(|c: char| c.is_ascii_digit()) {
        Ok(format!("_{guard}"))
    } else {
        Ok(guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed() {
        assert_eq!(prefixed(None, "opcode_size").unwrap(), "opcode_size");
        assert_eq!(prefixed(Some(""), "opcode_size").unwrap(), "opcode_size");
        assert_eq!(prefixed(Some("moz"), "opcode_size").unwrap(), "moz_opcode_size");
        assert_eq!(prefixed(Some("moz_"), "opcode_size").unwrap(), "moz_opcode_size");
        assert!(matches!(
            prefixed(Some("a-b"), "opcode_size"),
            Err(EmitError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn test_include_guard_from_file_name() {
        assert_eq!(include_guard(Path::new("src/vm_inst.h"), None).unwrap(), "VM_INST_H");
        assert_eq!(
            include_guard(Path::new("/tmp/build/vm-dump.inc.h"), None).unwrap(),
            "VM_DUMP_INC_H"
        );
        assert_eq!(include_guard(Path::new("2vm.h"), None).unwrap(), "_2VM_H");
    }

    #[test]
    fn test_include_guard_prefix() {
        assert_eq!(
            include_guard(Path::new("src/vm_inst.h"), Some("moz")).unwrap(),
            "MOZ_VM_INST_H"
        );
        assert_eq!(
            include_guard(Path::new("src/vm_inst.h"), Some("moz_")).unwrap(),
            "MOZ_VM_INST_H"
        );
    }

    #[test]
    fn test_include_guard_ignores_directory() {
        let a = include_guard(Path::new("a/vm_inst.h"), None).unwrap();
        let b = include_guard(Path::new("/abs/b/vm_inst.h"), None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_include_guard_prefix_disambiguates() {
        let path = Path::new("vm_inst.h");
        assert_ne!(
            include_guard(path, Some("peg")).unwrap(),
            include_guard(path, Some("regex")).unwrap()
        );
    }

    #[test]
    fn test_include_guard_rejects_empty_path() {
        assert!(matches!(
            include_guard(Path::new(""), None),
            Err(EmitError::InvalidGuardSeed(_))
        ));
        assert!(matches!(
            include_guard(Path::new(".."), None),
            Err(EmitError::InvalidGuardSeed(_))
        ));
    }
}

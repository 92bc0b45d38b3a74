//! The closed set of known locales and the pack/directory file naming
//! rules that key off it.

/// Order-significant: prefix stripping during multi-locale unpack tries
/// these in order.
pub const KNOWN_LOCALES: &[&str] = &[
    "english",
    "french",
    "german",
    "italian",
    "spanish",
    "russian",
    "polish",
    "japanese",
    "korean",
    "tchinese",
    "portuguese",
];

/// Reserved pack index for the shared multi-locale / delta-common data file.
pub const SHARED_PACK_INDEX: u16 = 0x1337;

pub fn normalize(locale: &str) -> &str {
    if locale.is_empty() { "english" } else { locale }
}

pub fn is_known(locale: &str) -> bool {
    KNOWN_LOCALES.contains(&locale)
}

/// `<target>_<level>.bsp.pak000_<patch:03>.vpk`
pub fn data_file_name(target: &str, level: &str, patch: u32) -> String {
    format!("{target}_{level}.bsp.pak000_{patch:03}.vpk")
}

/// `<locale><target>_<level>.bsp.pak000_dir.vpk`
pub fn directory_file_name(locale: &str, target: &str, level: &str) -> String {
    let locale = normalize(locale);
    let prefix = if locale == "english" {
        String::new()
    } else {
        locale.to_string()
    };
    format!("{prefix}{target}_{level}.bsp.pak000_dir.vpk")
}

/// `<target>_mp_delta_common.bsp.pak000_000.vpk`
pub fn shared_data_file_name(target: &str) -> String {
    format!("{target}_mp_delta_common.bsp.pak000_000.vpk")
}

/// Strips a known-locale prefix from a directory file's base name, returning
/// `(locale, remainder)`. `locale` is `"english"` when no known prefix
/// matches (the file is assumed unprefixed English).
pub fn strip_locale_prefix(file_name: &str) -> (&str, &str) {
    for locale in KNOWN_LOCALES {
        if *locale != "english"
            && let Some(rest) = file_name.strip_prefix(locale)
        {
            return (locale, rest);
        }
    }
    ("english", file_name)
}

/// `sanitize=1` behavior: if the path looks like a data file
/// (`pak000_NNN`), substitute `pak000_dir`; no-op if already a `_dir` file.
pub fn sanitize_to_directory_path(path: &str) -> String {
    if path.contains("pak000_dir") {
        return path.to_string();
    }
    if let Some(idx) = path.find("pak000_") {
        let tail_start = idx + "pak000_".len();
        if let Some(rest) = path.get(tail_start..)
            && rest.len() >= 3
            && rest.as_bytes()[..3].iter().all(u8::is_ascii_digit)
        {
            return format!("{}pak000_dir{}", &path[..idx], &rest[3..]);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_name_english_has_no_prefix() {
        assert_eq!(
            directory_file_name("", "mp_blah", "uber"),
            "mp_blah_uber.bsp.pak000_dir.vpk"
        );
    }

    #[test]
    fn directory_name_other_locale_is_prefixed() {
        assert_eq!(
            directory_file_name("french", "mp_blah", "uber"),
            "frenchmp_blah_uber.bsp.pak000_dir.vpk"
        );
    }

    #[test]
    fn sanitize_substitutes_pack_index() {
        assert_eq!(
            sanitize_to_directory_path("mp_blah_uber.bsp.pak000_000.vpk"),
            "mp_blah_uber.bsp.pak000_dir.vpk"
        );
    }

    #[test]
    fn sanitize_is_noop_on_dir_file() {
        let p = "mp_blah_uber.bsp.pak000_dir.vpk";
        assert_eq!(sanitize_to_directory_path(p), p);
    }

    #[test]
    fn strip_prefix_finds_known_locale() {
        assert_eq!(
            strip_locale_prefix("frenchmp_blah_uber.bsp.pak000_dir.vpk"),
            ("french", "mp_blah_uber.bsp.pak000_dir.vpk")
        );
    }
}

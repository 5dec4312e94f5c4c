//! Translation of caller-side filter lists into the portal's filter model.
//!
//! The portal expects `a(sa(us))`: an array of named filters, each holding
//! `(kind, pattern)` pairs where kind 0 is a glob. Callers hand us one of
//! two shapes: a list of `(name, "ext,ext")` items, or a single packed
//! `name\0pattern\0…\0\0` buffer with semicolon-separated globs.

pub(crate) type FilterPattern = (u32, String);
pub(crate) type Filter = (String, Vec<FilterPattern>);
pub(crate) type Filters = Vec<Filter>;

/// Pattern kind understood by the file chooser; 0 is a glob, 1 a MIME type.
const GLOB: u32 = 0;

static ALL_FILES: &str = "All files";

/// One named filter in the list shape: `spec` is a comma-separated list of
/// bare extensions, e.g. `("Source", "c,cpp,h")`. No wildcards, no dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterItem<'a> {
    pub name: &'a str,
    pub spec: &'a str,
}

/// The two filter shapes a dialog request can carry.
#[derive(Debug, Default, Clone, Copy)]
pub enum FilterSpec<'a> {
    /// No filtering; the portal shows every file.
    #[default]
    None,
    /// An ordered list of extension filters.
    Native(&'a [FilterItem<'a>]),
    /// A packed `name\0pattern\0…\0\0` buffer. Patterns are
    /// semicolon-separated globs; an empty pattern means "all files".
    /// `index` selects the initially active filter, 1-based; 0 or
    /// out-of-range falls back to the first.
    Windows { packed: &'a str, index: u32 },
}

/// A filter list encoded for the wire, plus the initially selected filter.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct EncodedFilters {
    pub(crate) filters: Filters,
    pub(crate) current: Filter,
}

/// Encode filters for an open or folder dialog. Returns `None` when there is
/// nothing to send.
pub(crate) fn for_open(spec: &FilterSpec<'_>) -> Option<EncodedFilters> {
    match spec {
        FilterSpec::None => None,
        FilterSpec::Native(items) => {
            let filters = native_list(items)?;
            let current = filters[0].clone();
            Some(EncodedFilters { filters, current })
        }
        FilterSpec::Windows { packed, index } => for_windows(packed, *index),
    }
}

/// Encode filters for a save dialog. When `default_name` carries an
/// extension found in one of the list filters, that filter becomes the
/// initially selected one; otherwise the wildcard entry is selected.
pub(crate) fn for_save(spec: &FilterSpec<'_>, default_name: Option<&str>) -> Option<EncodedFilters> {
    match spec {
        FilterSpec::None => None,
        FilterSpec::Native(items) => {
            let filters = native_list(items)?;
            let current = match default_name
                .and_then(name_extension)
                .and_then(|extn| items.iter().position(|item| spec_contains(item.spec, extn)))
            {
                Some(matched) => filters[matched].clone(),
                None => wildcard_entry(None),
            };
            Some(EncodedFilters { filters, current })
        }
        FilterSpec::Windows { packed, index } => for_windows(packed, *index),
    }
}

fn native_list(items: &[FilterItem<'_>]) -> Option<Filters> {
    if items.is_empty() {
        return None;
    }
    let mut filters: Filters = items.iter().map(native_entry).collect();
    filters.push(wildcard_entry(None));
    Some(filters)
}

/// `("Source", "c,cpp")` becomes `("Source (c, cpp)", ["*.c", "*.cpp"])`.
fn native_entry(item: &FilterItem<'_>) -> Filter {
    let mut label = String::with_capacity(item.name.len() + item.spec.len() + 3);
    label.push_str(item.name);
    label.push_str(" (");
    for ch in item.spec.chars() {
        label.push(ch);
        if ch == ',' {
            label.push(' ');
        }
    }
    label.push(')');
    let patterns = item
        .spec
        .split(',')
        .map(|extn| (GLOB, format!("*.{extn}")))
        .collect();
    (label, patterns)
}

fn for_windows(packed: &str, index: u32) -> Option<EncodedFilters> {
    let entries = parse_windows(packed);
    if entries.is_empty() {
        return None;
    }
    let filters: Filters = entries
        .iter()
        .map(|&(name, pattern)| {
            if pattern.is_empty() {
                wildcard_entry(Some(name))
            } else {
                windows_entry(name, pattern)
            }
        })
        .collect();
    let selected = (index as usize)
        .checked_sub(1)
        .filter(|i| *i < filters.len())
        .unwrap_or(0);
    let current = filters[selected].clone();
    Some(EncodedFilters { filters, current })
}

/// Walk the packed buffer into `(name, pattern)` pairs. A missing or empty
/// pattern behaves like a match-all filter and ends the walk.
fn parse_windows(packed: &str) -> Vec<(&str, &str)> {
    let mut parts = packed.split('\0');
    let mut entries = Vec::new();
    while let Some(name) = parts.next() {
        if name.is_empty() {
            break;
        }
        let pattern = parts.next().unwrap_or("");
        entries.push((name, pattern));
        if pattern.is_empty() {
            break;
        }
    }
    entries
}

fn windows_entry(name: &str, pattern: &str) -> Filter {
    let patterns = pattern
        .split(';')
        .map(|glob| {
            let glob = case_insensitive_glob(glob);
            log::debug!("appending filter {glob}");
            (GLOB, glob)
        })
        .collect();
    (name.to_owned(), patterns)
}

/// Wrap every ASCII letter into a `[xX]` class so the glob matches either
/// case; everything else passes through.
fn case_insensitive_glob(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len());
    for ch in glob.chars() {
        if ch.is_ascii_alphabetic() {
            out.push('[');
            out.push(ch.to_ascii_lowercase());
            out.push(ch.to_ascii_uppercase());
            out.push(']');
        } else {
            out.push(ch);
        }
    }
    out
}

fn wildcard_entry(name: Option<&str>) -> Filter {
    (
        name.unwrap_or(ALL_FILES).to_owned(),
        vec![(GLOB, String::from("*"))],
    )
}

/// The extension of `name` after its last dot, if there is one and it is
/// non-empty.
fn name_extension(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .map(|(_, extn)| extn)
        .filter(|extn| !extn.is_empty())
}

/// Byte-exact membership test of `extn` in a comma-separated spec.
fn spec_contains(spec: &str, extn: &str) -> bool {
    spec.split(',').any(|candidate| candidate == extn)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: FilterItem<'static> = FilterItem {
        name: "Source",
        spec: "c,cpp",
    };
    const HEADERS: FilterItem<'static> = FilterItem {
        name: "Headers",
        spec: "h",
    };

    #[test]
    fn native_entry_builds_label_and_globs() {
        let (label, patterns) = native_entry(&SOURCE);
        assert_eq!(label, "Source (c, cpp)");
        assert_eq!(
            patterns,
            vec![(0, "*.c".to_owned()), (0, "*.cpp".to_owned())]
        );
    }

    #[test]
    fn open_appends_wildcard_and_selects_first() {
        let encoded = for_open(&FilterSpec::Native(&[SOURCE, HEADERS])).unwrap();
        assert_eq!(encoded.filters.len(), 3);
        assert_eq!(encoded.filters[2].0, "All files");
        assert_eq!(encoded.filters[2].1, vec![(0, "*".to_owned())]);
        assert_eq!(encoded.current, encoded.filters[0]);
    }

    #[test]
    fn empty_shapes_encode_to_nothing() {
        assert!(for_open(&FilterSpec::None).is_none());
        assert!(for_open(&FilterSpec::Native(&[])).is_none());
        assert!(
            for_open(&FilterSpec::Windows {
                packed: "",
                index: 1
            })
            .is_none()
        );
    }

    #[test]
    fn save_selects_the_filter_matching_the_default_name() {
        let encoded = for_save(
            &FilterSpec::Native(&[FilterItem {
                name: "Src",
                spec: "cpp,c",
            }]),
            Some("x.cpp"),
        )
        .unwrap();
        assert_eq!(encoded.current.0, "Src (cpp, c)");
        assert_eq!(encoded.current.1[0], (0, "*.cpp".to_owned()));
    }

    #[test]
    fn save_without_a_match_selects_the_wildcard() {
        let spec = FilterSpec::Native(&[SOURCE]);
        for name in [Some("x.rs"), Some("noext"), Some("trailing."), None] {
            let encoded = for_save(&spec, name).unwrap();
            assert_eq!(encoded.current.0, "All files");
        }
    }

    #[test]
    fn extension_match_is_byte_exact() {
        // "CPP" must not match "cpp"; no case folding is applied.
        let encoded = for_save(&FilterSpec::Native(&[SOURCE]), Some("x.CPP")).unwrap();
        assert_eq!(encoded.current.0, "All files");
    }

    #[test]
    fn windows_patterns_are_case_wrapped() {
        let encoded = for_open(&FilterSpec::Windows {
            packed: "Text\0*.TXT\0\0",
            index: 1,
        })
        .unwrap();
        assert_eq!(encoded.filters.len(), 1);
        assert_eq!(encoded.current.0, "Text");
        assert_eq!(encoded.current.1, vec![(0, "*.[tT][xX][tT]".to_owned())]);
    }

    #[test]
    fn windows_semicolons_split_into_separate_patterns() {
        let encoded = for_open(&FilterSpec::Windows {
            packed: "C\0*.c;*.h\0\0",
            index: 1,
        })
        .unwrap();
        assert_eq!(
            encoded.filters[0].1,
            vec![(0, "*.[cC]".to_owned()), (0, "*.[hH]".to_owned())]
        );
    }

    #[test]
    fn windows_empty_pattern_collapses_to_named_wildcard() {
        let encoded = for_open(&FilterSpec::Windows {
            packed: "Everything\0\0Later\0*.x\0\0",
            index: 1,
        })
        .unwrap();
        // The walk stops at the collapsed entry; nothing after it is read.
        assert_eq!(encoded.filters.len(), 1);
        assert_eq!(
            encoded.filters[0],
            ("Everything".to_owned(), vec![(0, "*".to_owned())])
        );
    }

    #[test]
    fn windows_index_is_one_based_with_fallback() {
        let packed = "A\0*.a\0B\0*.b\0\0";
        let second = for_open(&FilterSpec::Windows { packed, index: 2 }).unwrap();
        assert_eq!(second.current.0, "B");
        for index in [0, 3, 99] {
            let fallback = for_open(&FilterSpec::Windows { packed, index }).unwrap();
            assert_eq!(fallback.current.0, "A");
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let spec = FilterSpec::Windows {
            packed: "Text\0*.txt;*.md\0All\0\0",
            index: 2,
        };
        assert_eq!(for_open(&spec), for_open(&spec));
        let native = FilterSpec::Native(&[SOURCE, HEADERS]);
        assert_eq!(for_save(&native, Some("a.h")), for_save(&native, Some("a.h")));
    }
}

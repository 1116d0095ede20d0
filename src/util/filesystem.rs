//! Path algebra for the dual-rooted namespace.
//!
//! Paths inside the namespace come in three spellings: source-absolute
//! (`//foo/bar`), system-absolute (`/usr/include` or a Windows drive path),
//! and relative. Separators inside the namespace are always forward slashes;
//! conversion to host form happens only at the boundary, in the downstream
//! tool. Filesystem-string comparisons branch on the *host* OS; anything
//! that ends up in generated text branches on the *target* OS instead.

use std::path::{Component, Path};

use crate::core::error::Error;
use crate::core::path::{SourceDir, SourceFile};
use crate::core::settings::TargetOs;
use crate::core::target::OutputType;
use crate::frontend::value::Value;

/// Classification of a source file by extension, subject to the target OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFileType {
    /// A C file (.c)
    C,
    /// A C++ file (.cc, .cpp, .cxx)
    Cc,
    /// A header (.h)
    Header,
    /// An Objective-C file (.m, macOS targets only)
    ObjC,
    /// An Objective-C++ file (.mm, macOS targets only)
    ObjCc,
    /// A Windows resource script (.rc)
    Rc,
    /// An assembly file (.S, non-Windows targets)
    Asm,
    /// Anything else; skipped by rule writers.
    Unknown,
}

/// Whether a character is a path separator.
///
/// Backslashes are accepted on every host because namespace paths may have
/// been spelled by a buildfile written on Windows.
#[inline]
pub fn is_slash(c: u8) -> bool {
    c == b'/' || c == b'\\'
}

/// Whether the last character of a string is a separator.
pub fn ends_with_slash(s: &str) -> bool {
    s.as_bytes().last().is_some_and(|&c| is_slash(c))
}

fn normalize_windows_path_char(c: u8) -> u8 {
    if c == b'/' {
        return b'\\';
    }
    c.to_ascii_lowercase()
}

/// Case- and slash-insensitive comparison of two 8-bit Windows paths.
fn are_absolute_windows_paths_equal(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .all(|(ca, cb)| normalize_windows_path_char(ca) == normalize_windows_path_char(cb))
}

/// Whether the path begins with a Windows drive spec: an ASCII letter, a
/// colon, and a separator.
pub fn does_begin_windows_drive_letter(path: &str) -> bool {
    let bytes = path.as_bytes();
    if bytes.len() < 3 {
        return false;
    }

    // Check colon first, this will generally fail fastest.
    if bytes[1] != b':' {
        return false;
    }

    if !bytes[0].is_ascii_alphabetic() {
        return false;
    }

    is_slash(bytes[2])
}

/// Whether a path is absolute in the OS sense.
///
/// A leading `//` is source-relative, not absolute. A Windows drive spec
/// counts as absolute on any host because it can appear in namespace
/// spellings.
pub fn is_path_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    if bytes.is_empty() {
        return false;
    }

    if !is_slash(bytes[0]) {
        if does_begin_windows_drive_letter(path) {
            return true;
        }
        return false; // Doesn't begin with a slash, is relative.
    }

    // Double forward slash at the beginning means source-relative (we don't
    // allow backslashes for denoting this).
    if bytes.len() > 1 && bytes[1] == b'/' {
        return false;
    }

    true
}

/// What a dot found during normalization turned out to be.
enum DotDisposition {
    /// The dot is just part of a filename.
    NotADirectory,
    /// The dot is the current directory.
    DirectoryCur,
    /// The first of a double dot that takes us up one level.
    DirectoryUp,
}

/// Examine the characters following a dot to see what the dot means.
/// Returns the disposition and how many input characters express it.
fn classify_after_dot(path: &[u8], after_dot: usize) -> (DotDisposition, usize) {
    if after_dot == path.len() {
        // Single dot at the end.
        return (DotDisposition::DirectoryCur, 1);
    }
    if is_slash(path[after_dot]) {
        // Single dot followed by a slash; consume the slash too.
        return (DotDisposition::DirectoryCur, 2);
    }

    if path[after_dot] == b'.' {
        // Two dots.
        if after_dot + 1 == path.len() {
            // Double dot at the end.
            return (DotDisposition::DirectoryUp, 2);
        }
        if is_slash(path[after_dot + 1]) {
            // Double dot followed by a slash.
            return (DotDisposition::DirectoryUp, 3);
        }
    }

    // The dots are followed by something else, not a directory.
    (DotDisposition::NotADirectory, 1)
}

/// Normalize a path in place.
///
/// Collapses separator runs to a single forward slash and resolves `.` and
/// `..` components. The leading anchor (`//`, `/`, a drive spec, or nothing)
/// is preserved. In a relative path that has collapsed to empty, `..` is
/// kept and becomes a new root so further `..` accumulate; in an absolute
/// path, `..` at the root is silently dropped.
pub fn normalize_path(path: &mut String) {
    let mut buf = std::mem::take(path).into_bytes();

    // top_index is the first character we can modify in the path. Anything
    // before this indicates where the path is relative to.
    let mut top_index = 0;
    let mut is_relative = true;
    if !buf.is_empty() && buf[0] == b'/' {
        is_relative = false;

        if buf.len() > 1 && buf[1] == b'/' {
            // Two leading slashes, this is a path into the source dir.
            top_index = 2;
        } else {
            // One leading slash, this is a system-absolute path.
            top_index = 1;
        }
    } else if does_begin_windows_drive_letter(path_str(&buf)) {
        // Drive spec plus separator, e.g. "C:/".
        is_relative = false;
        buf[2] = b'/';
        top_index = 3;
    }

    let mut dest_i = top_index;
    let mut src_i = top_index;
    while src_i < buf.len() {
        if buf[src_i] == b'.' {
            if src_i == 0 || is_slash(buf[src_i - 1]) {
                // Slash followed by a dot, see if it's something special.
                let (disposition, consumed_len) = classify_after_dot(&buf, src_i + 1);
                match disposition {
                    DotDisposition::NotADirectory => {
                        // Copy the dot to the output, it means nothing special.
                        buf[dest_i] = buf[src_i];
                        dest_i += 1;
                        src_i += 1;
                    }
                    DotDisposition::DirectoryCur => {
                        // Current directory, just skip the input.
                        src_i += consumed_len;
                    }
                    DotDisposition::DirectoryUp => {
                        // Back up over the previous directory component. If
                        // we're already at the top, preserve the "..".
                        if dest_i > top_index {
                            // The previous char was a slash, remove it.
                            dest_i -= 1;
                        }

                        if dest_i == top_index {
                            if is_relative {
                                // Already at the beginning of a relative
                                // input: keep the ".." (plus the trailing
                                // slash if there was one). This also makes a
                                // new "root" that can't be deleted by going
                                // up more levels, otherwise "../.." would
                                // collapse to nothing.
                                buf[dest_i] = b'.';
                                buf[dest_i + 1] = b'.';
                                dest_i += 2;
                                if consumed_len == 3 {
                                    buf[dest_i] = b'/';
                                    dest_i += 1;
                                }
                                top_index = dest_i;
                            }
                            // Otherwise we're at the beginning of an absolute
                            // path. Don't allow ".." to go up another level,
                            // just eat it.
                        } else {
                            // Just find the previous slash or the beginning
                            // of input.
                            while dest_i > 0 && !is_slash(buf[dest_i - 1]) {
                                dest_i -= 1;
                            }
                        }
                        src_i += consumed_len;
                    }
                }
            } else {
                // Dot not preceded by a slash, copy it literally.
                buf[dest_i] = buf[src_i];
                dest_i += 1;
                src_i += 1;
            }
        } else if is_slash(buf[src_i]) {
            if src_i > 0 && is_slash(buf[src_i - 1]) {
                // Two slashes in a row, skip over it.
                src_i += 1;
            } else {
                // Just one slash, copy it, normalizing to forward slash.
                buf[dest_i] = b'/';
                dest_i += 1;
                src_i += 1;
            }
        } else {
            // Input nothing special, just copy it.
            buf[dest_i] = buf[src_i];
            dest_i += 1;
            src_i += 1;
        }
    }

    buf.truncate(dest_i);
    *path = String::from_utf8(buf).expect("normalization preserves UTF-8 segments");
}

fn path_str(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).unwrap_or("")
}

/// Convert an absolute OS path to source-relative (`//...`) if it lies
/// beneath the source root.
///
/// The comparison is case- and slash-insensitive on a Windows host and exact
/// elsewhere. On Windows both `C:\foo` and `/C:/foo` spellings are accepted
/// for the candidate path.
pub fn make_absolute_path_relative_if_possible(source_root: &str, path: &str) -> Option<String> {
    debug_assert!(is_path_absolute(source_root));
    debug_assert!(is_path_absolute(path));

    if cfg!(windows) {
        windows_source_relative(source_root, path)
    } else {
        posix_source_relative(source_root, path)
    }
}

fn windows_source_relative(source_root: &str, path: &str) -> Option<String> {
    if source_root.len() > path.len() {
        return None; // The source root is longer: the path can never be inside.
    }

    // The source root is expected canonical: a drive spec with no leading
    // slash.
    debug_assert!(does_begin_windows_drive_letter(source_root));

    let after_common_index;
    if does_begin_windows_drive_letter(path) {
        // Handle "C:\foo".
        if are_absolute_windows_paths_equal(source_root, &path[..source_root.len()]) {
            after_common_index = source_root.len();
        } else {
            return None;
        }
    } else if path.as_bytes()[0] == b'/'
        && source_root.len() <= path.len() - 1
        && does_begin_windows_drive_letter(&path[1..])
    {
        // Handle "/C:/foo".
        if are_absolute_windows_paths_equal(source_root, &path[1..=source_root.len()]) {
            after_common_index = source_root.len() + 1;
        } else {
            return None;
        }
    } else {
        return None;
    }

    // The base may or may not have a trailing slash, so skip all slashes
    // from the path after our prefix match.
    let bytes = path.as_bytes();
    let mut first_after_slash = after_common_index;
    while first_after_slash < bytes.len() && is_slash(bytes[first_after_slash]) {
        first_after_slash += 1;
    }

    Some(format!("//{}", &path[first_after_slash..]))
}

fn posix_source_relative(source_root: &str, path: &str) -> Option<String> {
    if source_root.len() > path.len() {
        return None;
    }

    // Since we know both are absolute, just do a prefix check.
    if &path[..source_root.len()] != source_root {
        return None;
    }

    // The base may or may not have a trailing slash, so skip all slashes
    // from the path after our prefix match.
    let bytes = path.as_bytes();
    let mut first_after_slash = source_root.len();
    while first_after_slash < bytes.len() && is_slash(bytes[first_after_slash]) {
        first_after_slash += 1;
    }

    Some(format!("//{}", &path[first_after_slash..]))
}

/// Produce the relative inverse of a directory: `"../"` once per internal
/// segment, such that composing the directory with the result yields the
/// source root. Empty input gives empty output.
pub fn invert_dir(dir: &SourceDir) -> String {
    let value = dir.value();
    if value.is_empty() {
        return String::new();
    }

    let bytes = value.as_bytes();
    debug_assert!(bytes[0] == b'/');
    let mut begin_index = 1;

    // If the input begins with two slashes, skip over both (this is a
    // source-relative dir). These must be forward slashes only.
    if bytes.len() > 1 && bytes[1] == b'/' {
        begin_index = 2;
    }

    let mut ret = String::new();
    for &c in &bytes[begin_index..] {
        if is_slash(c) {
            ret.push_str("../");
        }
    }
    ret
}

/// Rebase a source-absolute path to be relative to a source-absolute
/// directory. Returns `.` when the two are the same.
pub fn rebase_source_absolute_path(input: &str, dest_dir: &SourceDir) -> String {
    assert!(
        input.len() >= 2 && input.starts_with("//"),
        "input to rebase isn't source-absolute: {input}"
    );
    assert!(
        dest_dir.is_source_absolute(),
        "dir to rebase to isn't source-absolute: {}",
        dest_dir.value()
    );

    let dest = dest_dir.value().as_bytes();
    let input_bytes = input.as_bytes();

    // Skip the common prefixes of the source and dest as long as they end in
    // a [back]slash.
    let mut common_prefix_len = 2; // The beginning two "//" are always the same.
    let max_common_length = input_bytes.len().min(dest.len());
    for i in common_prefix_len..max_common_length {
        if is_slash(input_bytes[i]) && is_slash(dest[i]) {
            common_prefix_len = i + 1;
        } else if input_bytes[i] != dest[i] {
            break;
        }
    }

    // Invert the dest dir starting from the end of the common prefix.
    let mut ret = String::new();
    for &c in &dest[common_prefix_len..] {
        if is_slash(c) {
            ret.push_str("../");
        }
    }

    // Append any remaining unique input.
    ret.push_str(&input[common_prefix_len..]);

    // If the result is still empty, the paths are the same.
    if ret.is_empty() {
        ret.push('.');
    }

    ret
}

/// A directory value with the trailing slash removed, keeping the root
/// spellings addressable: `/` becomes `/.` and `//` becomes `//.`.
pub fn directory_with_no_last_slash(dir: &SourceDir) -> String {
    let value = dir.value();
    if value.is_empty() {
        String::new()
    } else if value == "/" {
        "/.".to_string()
    } else if value == "//" {
        "//.".to_string()
    } else {
        value[..value.len() - 1].to_string()
    }
}

/// Byte offset of the character following the last `.` that appears after
/// the last separator, or None when the filename has no extension.
pub fn find_extension_offset(path: &str) -> Option<usize> {
    let bytes = path.as_bytes();
    for i in (0..bytes.len()).rev() {
        if is_slash(bytes[i]) {
            break;
        }
        if bytes[i] == b'.' {
            return Some(i + 1);
        }
    }
    None
}

/// The extension of the file named by the path, without the dot. Empty when
/// there is none.
pub fn find_extension(path: &str) -> &str {
    match find_extension_offset(path) {
        Some(offset) => &path[offset..],
        None => "",
    }
}

/// Byte offset where the filename starts: after the last separator, or 0
/// when the whole string is the filename.
pub fn find_filename_offset(path: &str) -> usize {
    let bytes = path.as_bytes();
    for i in (0..bytes.len()).rev() {
        if is_slash(bytes[i]) {
            return i + 1;
        }
    }
    0 // No filename found means everything was the filename.
}

/// The filename part of the path (everything after the last separator).
pub fn find_filename(path: &str) -> &str {
    &path[find_filename_offset(path)..]
}

/// The filename with its extension (and the dot) removed.
pub fn find_filename_no_extension(path: &str) -> &str {
    if path.is_empty() {
        return "";
    }
    let filename_offset = find_filename_offset(path);
    match find_extension_offset(path) {
        Some(extension_offset) => &path[filename_offset..extension_offset - 1],
        None => &path[filename_offset..],
    }
}

/// Truncate the path to its directory part, keeping the trailing slash.
pub fn remove_filename(path: &mut String) {
    path.truncate(find_filename_offset(path));
}

/// The directory part of the path including the trailing slash, or empty
/// when there is no directory part.
pub fn find_dir(path: &str) -> &str {
    &path[..find_filename_offset(path)]
}

/// Verify that a generated-file string lies inside the output directory.
///
/// The candidate must match the whole directory including its trailing
/// separator, so a sibling directory sharing a name prefix does not pass.
pub fn ensure_string_is_in_output_dir(
    dir: &SourceDir,
    s: &str,
    originating: Option<&Value>,
) -> Result<(), Error> {
    if s.starts_with(dir.value()) {
        return Ok(());
    }

    let mut err = Error::new("File is not inside output directory.").with_help(format!(
        "The given file should be in the output directory. Normally you would specify\n\
         \"$target_out_dir/foo\" or \"$target_gen_dir/foo\". I interpreted this as\n\"{s}\"."
    ));
    if let Some(origin) = originating.and_then(|v| v.origin()) {
        err = err.with_location(origin.clone());
    }
    Err(err)
}

/// Split a path into components the way the namespace needs: the root
/// separator is dropped, and on a drive-lettered path the bare separator
/// following the drive is dropped too.
fn get_path_components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::RootDir => None,
            Component::Prefix(p) => Some(p.as_os_str().to_string_lossy().into_owned()),
            Component::CurDir => None,
            Component::ParentDir => Some("..".to_string()),
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
        })
        .collect()
}

/// Equality for filesystem strings: case-insensitive on a Windows host,
/// exact elsewhere.
fn filesystem_strings_equal(a: &str, b: &str) -> bool {
    if cfg!(windows) {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

/// Express an absolute OS path as a namespace directory.
///
/// If the path lies beneath the source root the result is source-absolute
/// (`//...`); otherwise it is system-absolute (`/...`). The result always
/// ends in a slash.
pub fn source_dir_for_path(source_root: &Path, path: &Path) -> SourceDir {
    let source_comp = get_path_components(source_root);
    let path_comp = get_path_components(path);

    // See if path is inside the source root by looking for each of source
    // root's components at the beginning of path.
    let is_inside_source = path_comp.len() >= source_comp.len()
        && source_comp
            .iter()
            .zip(path_comp.iter())
            .all(|(s, p)| filesystem_strings_equal(s, p));

    let (mut result_str, initial_path_comp_to_use) = if is_inside_source {
        // Construct a source-relative path beginning in // and skip all of
        // the shared directories.
        ("//".to_string(), source_comp.len())
    } else {
        // Not inside source code, construct a system-absolute path.
        ("/".to_string(), 0)
    };

    for comp in &path_comp[initial_path_comp_to_use..] {
        result_str.push_str(comp);
        result_str.push('/');
    }
    SourceDir::new(result_str)
}

/// Classify a source file by extension, subject to the target OS.
pub fn get_source_file_type(file: &SourceFile, os: TargetOs) -> SourceFileType {
    let extension = find_extension(file.value());
    match extension {
        "cc" | "cpp" | "cxx" => return SourceFileType::Cc,
        "h" => return SourceFileType::Header,
        "c" => return SourceFileType::C,
        _ => {}
    }

    match os {
        TargetOs::Mac => {
            if extension == "m" {
                return SourceFileType::ObjC;
            }
            if extension == "mm" {
                return SourceFileType::ObjCc;
            }
        }
        TargetOs::Win => {
            if extension == "rc" {
                return SourceFileType::Rc;
            }
        }
        TargetOs::Linux => {}
    }

    if os != TargetOs::Win && extension == "S" {
        return SourceFileType::Asm;
    }

    SourceFileType::Unknown
}

/// The default file extension for a binary output type on a target OS.
///
/// Empty means the output has no extension (POSIX executables). Only binary
/// output types have table entries; everything else is empty. On Windows the
/// shared-library entry is the extension of the import library, which is
/// what dependents link against.
pub fn extension_for_output_type(output_type: OutputType, os: TargetOs) -> &'static str {
    match os {
        TargetOs::Mac => match output_type {
            OutputType::Executable => "",
            OutputType::SharedLibrary => "dylib",
            OutputType::StaticLibrary => "a",
            _ => "",
        },
        TargetOs::Win => match output_type {
            OutputType::Executable => "exe",
            OutputType::SharedLibrary => "dll.lib",
            OutputType::StaticLibrary => "lib",
            _ => "",
        },
        TargetOs::Linux => match output_type {
            OutputType::Executable => "",
            OutputType::SharedLibrary => "so",
            OutputType::StaticLibrary => "a",
            _ => "",
        },
    }
}

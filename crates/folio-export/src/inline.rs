//! Image inlining for self-contained export pages.
//!
//! Exported pages are converted far away from the site that serves their
//! uploads, so every site-relative `<img src="/...">` is replaced with a
//! base64 `data:` URI read from the asset root. Inlining is best-effort:
//! an image that cannot be resolved or read keeps its original `src`.
//!
//! Markup goes through the html5ever tree builder, which recovers from
//! unclosed and misnested tags the way a browser does.

use std::fs;
use std::path::{Component, Path, PathBuf};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use html5ever::serialize::{SerializeOpts, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{ParseOpts, local_name, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use percent_encoding::percent_decode_str;

/// Replace site-relative image sources with embedded data URIs.
///
/// When no image is rewritten the input is returned unchanged. Otherwise the
/// repaired document is re-serialized, which may add the implied
/// `<html>`, `<head>` and `<body>` elements around fragments.
pub fn inline_images(html: &str, asset_root: &Path) -> String {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);

    let mut rewritten = 0usize;
    let mut stack: Vec<Handle> = vec![dom.document.clone()];
    while let Some(node) = stack.pop() {
        if let NodeData::Element { name, attrs, .. } = &node.data
            && name.local == local_name!("img")
        {
            for attr in attrs.borrow_mut().iter_mut() {
                if attr.name.local != local_name!("src") {
                    continue;
                }
                if let Some(uri) = data_uri(&attr.value, asset_root) {
                    attr.value = StrTendril::from(uri);
                    rewritten += 1;
                }
            }
        }
        stack.extend(node.children.borrow().iter().cloned());
    }

    if rewritten == 0 {
        return html.to_owned();
    }
    tracing::debug!(images = rewritten, "Inlined images");

    let document: SerializableHandle = dom.document.clone().into();
    let mut out = Vec::with_capacity(html.len());
    if let Err(e) = serialize(&mut out, &document, SerializeOpts::default()) {
        tracing::warn!(error = %e, "Failed to serialize page, keeping original markup");
        return html.to_owned();
    }
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Resolve a site-relative URL path against the asset root.
///
/// Only paths starting with a single `/` qualify; protocol-relative URLs
/// (`//host/...`), absolute URLs and `data:` URIs return `None`. Query and
/// fragment are dropped and the path is percent-decoded. Paths that would
/// escape the asset root through `..` are rejected.
pub fn resolve_site_path(src: &str, asset_root: &Path) -> Option<PathBuf> {
    let src = src.trim();
    if !src.starts_with('/') || src.starts_with("//") {
        return None;
    }

    let end = src.find(['?', '#']).unwrap_or(src.len());
    let decoded = percent_decode_str(&src[..end]).decode_utf8().ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));

    let confined = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !confined || relative.as_os_str().is_empty() {
        return None;
    }

    Some(asset_root.join(relative))
}

/// Build the data URI for an image source, if it resolves to a readable file.
fn data_uri(src: &str, asset_root: &Path) -> Option<String> {
    let path = resolve_site_path(src, asset_root)?;
    let Some(subtype) = image_subtype(&path) else {
        tracing::debug!(src, "Skipping image without extension");
        return None;
    };

    match fs::read(&path) {
        Ok(bytes) => Some(format!(
            "data:image/{subtype};base64,{}",
            BASE64_STANDARD.encode(bytes)
        )),
        Err(e) => {
            tracing::debug!(src, path = %path.display(), error = %e, "Skipping unreadable image");
            None
        }
    }
}

/// Media subtype for an image, derived from its file extension.
fn image_subtype(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let subtype = match ext.as_str() {
        "" => return None,
        "jpg" => "jpeg".to_owned(),
        "svg" => "svg+xml".to_owned(),
        "ico" => "x-icon".to_owned(),
        "tif" => "tiff".to_owned(),
        _ => ext,
    };
    Some(subtype)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0xFF];

    fn asset_root() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("uploads")).unwrap();
        fs::write(tmp.path().join("uploads/x.png"), PNG_BYTES).unwrap();
        tmp
    }

    /// Extract and decode the first base64 payload in `html`.
    fn first_payload(html: &str, media_type: &str) -> Vec<u8> {
        let marker = format!("data:{media_type};base64,");
        let start = html.find(&marker).expect("data uri present") + marker.len();
        let end = start + html[start..].find('"').unwrap();
        BASE64_STANDARD.decode(&html[start..end]).unwrap()
    }

    #[test]
    fn test_inlines_site_relative_image() {
        let root = asset_root();
        let html = inline_images(r#"<img src="/uploads/x.png">"#, root.path());

        assert!(html.contains(r#"<img src="data:image/png;base64,"#));
        assert_eq!(first_payload(&html, "image/png"), PNG_BYTES);
    }

    #[test]
    fn test_missing_image_leaves_markup_identical() {
        let root = asset_root();
        let input = r#"<p>Look: <img src="/uploads/missing.png" alt="gone"></p>"#;

        assert_eq!(inline_images(input, root.path()), input);
    }

    #[test]
    fn test_absolute_and_data_urls_untouched() {
        let root = asset_root();
        let input = concat!(
            r#"<img src="https://example.com/uploads/x.png">"#,
            r#"<img src="data:image/gif;base64,R0lGOD">"#,
            r#"<img src="//cdn.example.com/uploads/x.png">"#,
            r#"<img src="uploads/x.png">"#,
        );

        assert_eq!(inline_images(input, root.path()), input);
    }

    #[test]
    fn test_missing_image_kept_next_to_inlined_one() {
        let root = asset_root();
        let html = inline_images(
            r#"<img src="/uploads/x.png"><img src="/uploads/nope.png">"#,
            root.path(),
        );

        assert!(html.contains("data:image/png;base64,"));
        assert!(html.contains(r#"src="/uploads/nope.png""#));
    }

    #[test]
    fn test_malformed_html_still_inlined() {
        let root = asset_root();
        let html = inline_images(
            r#"<div><p>unclosed <b>bold <img src="/uploads/x.png"></i><span>"#,
            root.path(),
        );

        assert_eq!(first_payload(&html, "image/png"), PNG_BYTES);
        assert!(html.contains("unclosed"));
    }

    #[test]
    fn test_query_string_and_percent_encoding() {
        let root = asset_root();
        fs::write(root.path().join("uploads/my pic.JPG"), b"jpeg-bytes").unwrap();

        let html = inline_images(
            r#"<img src="/uploads/my%20pic.JPG?v=3#frag">"#,
            root.path(),
        );

        assert_eq!(first_payload(&html, "image/jpeg"), b"jpeg-bytes");
    }

    #[test]
    fn test_full_document_keeps_structure() {
        let root = asset_root();
        let html = inline_images(
            "<!DOCTYPE html><html><head><title>T</title></head>\
             <body><h1>Title</h1><img src=\"/uploads/x.png\"></body></html>",
            root.path(),
        );

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>T</title>"));
        assert!(html.contains("<h1>Title</h1>"));
    }

    #[test]
    fn test_resolve_rejects_parent_traversal() {
        let root = Path::new("/srv/site");

        assert_eq!(resolve_site_path("/../etc/passwd.png", root), None);
        assert_eq!(resolve_site_path("/uploads/%2E%2E/%2E%2E/x.png", root), None);
        assert_eq!(resolve_site_path("/", root), None);
    }

    #[test]
    fn test_resolve_site_path() {
        let root = Path::new("/srv/site");

        assert_eq!(
            resolve_site_path("/uploads/a/b.png", root),
            Some(PathBuf::from("/srv/site/uploads/a/b.png"))
        );
        assert_eq!(resolve_site_path("https://x/y.png", root), None);
        assert_eq!(resolve_site_path("//x/y.png", root), None);
    }

    #[test]
    fn test_image_subtype() {
        assert_eq!(image_subtype(Path::new("a.png")).as_deref(), Some("png"));
        assert_eq!(image_subtype(Path::new("a.JPG")).as_deref(), Some("jpeg"));
        assert_eq!(image_subtype(Path::new("a.svg")).as_deref(), Some("svg+xml"));
        assert_eq!(image_subtype(Path::new("a.webp")).as_deref(), Some("webp"));
        assert_eq!(image_subtype(Path::new("noext")), None);
    }
}

// Static frontend served from a directory on disk

use std::path::{Component, Path, PathBuf};

use actix_web::{http::header, http::Method, web, HttpRequest, HttpResponse};

/// Root directory for static assets.
#[derive(Debug, Clone)]
pub struct StaticDir(pub PathBuf);

/// Fallback service: serve `GET`/`HEAD` requests from the static directory.
/// Directories resolve to their `index.html`.
pub async fn serve(req: HttpRequest, dir: web::Data<StaticDir>) -> HttpResponse {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return HttpResponse::NotFound().finish();
    }

    let Some(mut path) = resolve(&dir.0, req.path()) else {
        return HttpResponse::NotFound().finish();
    };
    if tokio::fs::metadata(&path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        path.push("index.html");
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            HttpResponse::Ok()
                .insert_header((header::CONTENT_TYPE, mime.as_ref()))
                .body(bytes)
        }
        Err(_) => HttpResponse::NotFound().finish(),
    }
}

/// Map a request path onto `root`, refusing anything that could escape it.
fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut out = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_stays_inside_root() {
        let root = Path::new("/srv/static");
        assert_eq!(resolve(root, "/"), Some(PathBuf::from("/srv/static")));
        assert_eq!(
            resolve(root, "/js/app.js"),
            Some(PathBuf::from("/srv/static/js/app.js"))
        );
        assert_eq!(resolve(root, "/../etc/passwd"), None);
        assert_eq!(resolve(root, "/js/../../secret"), None);
    }
}

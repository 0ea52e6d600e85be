//! # Servido de Archivos
//! src/files/mod.rs
//!
//! Este módulo es el sustrato que convierte una ruta de archivo en una
//! respuesta HTTP completa:
//!
//! - Content-Type según la extensión
//! - ETag (SHA256 del contenido) y revalidación con `If-None-Match`
//! - Rangos de bytes (`Range: bytes=...`) con 206/416
//! - Compresión gzip cuando el cliente la acepta
//! - Soporte HEAD (mismos headers, sin body)
//!
//! También crea el contenido por defecto de la raíz de estáticos la
//! primera vez que se arranca contra un directorio inexistente.

use crate::http::{Method, Request, Response, StatusCode};
use crate::resolver::{self, FALLBACK_PAGE, HOME_PAGE};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Contenido por defecto de la página principal
const DEFAULT_HOME_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Página principal</title>
    <style>
        body { font-family: Arial, sans-serif; text-align: center; padding: 50px; }
        h1 { color: #3498db; }
    </style>
</head>
<body>
    <h1>¡Bienvenido a mi servidor!</h1>
    <p>Esta es la página por defecto. Reemplázala con tu propio contenido.</p>
</body>
</html>
"#;

/// Contenido por defecto de la página 404 personalizada
const DEFAULT_FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>404 Not Found</title>
    <style>
        body {
            font-family: Arial, sans-serif;
            text-align: center;
            padding: 50px;
            background-color: #f5f5f5;
        }
        .error-container {
            background: white;
            padding: 40px;
            border-radius: 10px;
            box-shadow: 0 0 10px rgba(0,0,0,0.1);
            display: inline-block;
        }
        h1 { color: #e74c3c; }
        a {
            color: #3498db;
            text-decoration: none;
        }
        a:hover { text-decoration: underline; }
    </style>
</head>
<body>
    <div class="error-container">
        <h1>404</h1>
        <h2>Página no encontrada</h2>
        <p>Lo sentimos, la página que buscas no existe.</p>
        <p><a href="/">Volver a la página principal</a></p>
    </div>
</body>
</html>
"#;

/// Resultado de interpretar el header `Range` contra un archivo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// Sin header Range (o con un rango que se ignora): servir completo
    Whole,

    /// Rango válido: servir los bytes `start..=end`
    Slice { start: usize, end: usize },

    /// Rango fuera del archivo: responder 416
    Unsatisfiable,
}

/// Sirve un archivo existente con negociación de contenido estándar
///
/// El orden de evaluación es:
/// 1. `If-None-Match` → 304 si el ETag coincide
/// 2. `Range` → 206 con el slice pedido (sin compresión) o 416
/// 3. Respuesta completa, comprimida con gzip si se negoció
pub fn serve_file(path: &Path, request: &Request) -> Response {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            return Response::error(
                StatusCode::InternalServerError,
                &format!("Cannot read file: {}", e),
            );
        }
    };

    let head = request.method() == Method::HEAD;
    let etag = entity_tag(&data);

    // 1. Revalidación: si el cliente ya tiene esta versión, 304
    if let Some(tags) = request.header("If-None-Match") {
        if tags.split(',').any(|t| t.trim() == etag || t.trim() == "*") {
            return Response::new(StatusCode::NotModified).with_header("ETag", &etag);
        }
    }

    let content_type = content_type_for(path);

    // 2. Rangos de bytes (los parciales no se comprimen)
    match resolve_range(request.header("Range"), data.len()) {
        ByteRange::Unsatisfiable => {
            return Response::new(StatusCode::RangeNotSatisfiable)
                .with_header("Content-Range", &format!("bytes */{}", data.len()));
        }
        ByteRange::Slice { start, end } => {
            let response = Response::new(StatusCode::PartialContent)
                .with_header("Content-Type", content_type)
                .with_header("ETag", &etag)
                .with_header("Accept-Ranges", "bytes")
                .with_header(
                    "Content-Range",
                    &format!("bytes {}-{}/{}", start, end, data.len()),
                )
                .with_body_bytes(data[start..=end].to_vec());
            return finish(response, head);
        }
        ByteRange::Whole => {}
    }

    // 3. Respuesta completa, con gzip si el cliente lo acepta
    let response = Response::new(StatusCode::Ok)
        .with_header("Content-Type", content_type)
        .with_header("ETag", &etag)
        .with_header("Accept-Ranges", "bytes");

    let response = if accepts_gzip(request) && is_compressible(content_type) {
        match gzip_compress(&data) {
            Ok(compressed) => response
                .with_header("Content-Encoding", "gzip")
                .with_body_bytes(compressed),
            // Si la compresión falla se sirve sin comprimir
            Err(_) => response.with_body_bytes(data),
        }
    } else {
        response.with_body_bytes(data)
    };

    finish(response, head)
}

/// Sirve el 404 personalizado con su contenido tal cual
///
/// Si el archivo no se puede leer, cae a la página 404 generada.
pub fn serve_fallback_file(path: &Path, request_path: &str, head: bool) -> Response {
    let response = match fs::read(path) {
        Ok(data) => Response::new(StatusCode::NotFound)
            .with_header("Content-Type", content_type_for(path))
            .with_body_bytes(data),
        Err(_) => default_not_found(request_path),
    };
    finish(response, head)
}

/// Construye la respuesta 404 con la página generada por defecto
pub fn serve_default_not_found(request_path: &str, head: bool) -> Response {
    finish(default_not_found(request_path), head)
}

fn default_not_found(request_path: &str) -> Response {
    Response::new(StatusCode::NotFound)
        .with_header("Content-Type", "text/html; charset=utf-8")
        .with_body(&resolver::default_not_found_page(request_path))
}

/// Para HEAD se descarta el body conservando los headers
fn finish(response: Response, head: bool) -> Response {
    if head {
        response.without_body()
    } else {
        response
    }
}

/// Crea la raíz de estáticos con su contenido por defecto si no existe
///
/// Retorna `Ok(true)` si el directorio fue creado en esta llamada. Los
/// fallos al escribir las páginas individuales se reportan pero no
/// impiden el arranque; el fallo al crear el directorio sí se propaga.
pub fn ensure_default_site(root: &Path) -> std::io::Result<bool> {
    if root.exists() {
        return Ok(false);
    }

    fs::create_dir_all(root)?;

    if let Err(e) = fs::write(root.join(HOME_PAGE), DEFAULT_HOME_PAGE) {
        eprintln!("⚠️  No se pudo escribir {}: {}", HOME_PAGE, e);
    }
    if let Err(e) = fs::write(root.join(FALLBACK_PAGE), DEFAULT_FALLBACK_PAGE) {
        eprintln!("⚠️  No se pudo escribir {}: {}", FALLBACK_PAGE, e);
    }

    Ok(true)
}

/// Calcula el ETag de un contenido: SHA256 en hex, entre comillas
pub fn entity_tag(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("\"{:x}\"", hasher.finalize())
}

/// Comprime un contenido con gzip
fn gzip_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Verifica si el cliente acepta gzip en Accept-Encoding
fn accepts_gzip(request: &Request) -> bool {
    request
        .header("Accept-Encoding")
        .map(|value| {
            value.split(',').any(|enc| {
                let enc = enc.trim();
                enc == "gzip" || enc.starts_with("gzip;")
            })
        })
        .unwrap_or(false)
}

/// Tipos de contenido que vale la pena comprimir
fn is_compressible(content_type: &str) -> bool {
    content_type.starts_with("text/")
        || content_type == "application/javascript"
        || content_type == "application/json"
        || content_type == "application/xml"
        || content_type == "image/svg+xml"
}

/// Interpreta el header `Range` contra un archivo de `len` bytes
///
/// Soporta un único rango `bytes=a-b`, `bytes=a-` y el sufijo
/// `bytes=-n`. Los rangos malformados o múltiples se ignoran (se sirve
/// el archivo completo); los que quedan fuera del archivo son 416.
pub fn resolve_range(header: Option<&str>, len: usize) -> ByteRange {
    let spec = match header {
        Some(h) => h.trim(),
        None => return ByteRange::Whole,
    };

    // Unidades distintas de bytes se ignoran
    let spec = match spec.strip_prefix("bytes=") {
        Some(s) => s.trim(),
        None => return ByteRange::Whole,
    };

    // Multi-rango no soportado
    if spec.contains(',') {
        return ByteRange::Whole;
    }

    let (start_str, end_str) = match spec.split_once('-') {
        Some(parts) => parts,
        None => return ByteRange::Whole,
    };

    if len == 0 {
        return ByteRange::Unsatisfiable;
    }

    if start_str.is_empty() {
        // Rango sufijo: "-n" son los últimos n bytes
        let n: usize = match end_str.parse() {
            Ok(n) => n,
            Err(_) => return ByteRange::Whole,
        };
        if n == 0 {
            return ByteRange::Unsatisfiable;
        }
        let n = n.min(len);
        return ByteRange::Slice {
            start: len - n,
            end: len - 1,
        };
    }

    let start: usize = match start_str.parse() {
        Ok(s) => s,
        Err(_) => return ByteRange::Whole,
    };
    if start >= len {
        return ByteRange::Unsatisfiable;
    }

    let end = if end_str.is_empty() {
        len - 1
    } else {
        match end_str.parse::<usize>() {
            Ok(e) => e.min(len - 1),
            Err(_) => return ByteRange::Whole,
        }
    };

    if end < start {
        return ByteRange::Whole;
    }

    ByteRange::Slice { start, end }
}

/// Determina el Content-Type según la extensión del archivo
///
/// # Ejemplo
/// ```
/// use std::path::Path;
/// use static_server::files::content_type_for;
///
/// assert_eq!(content_type_for(Path::new("index.html")), "text/html; charset=utf-8");
/// assert_eq!(content_type_for(Path::new("logo.png")), "image/png");
/// ```
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("xml") => "application/xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

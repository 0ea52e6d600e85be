//! Tests de integración del ciclo de vida del servidor
//! tests/lifecycle_test.rs
//!
//! A diferencia de un binario suelto, acá podemos construir el
//! controlador dentro del test y arrancar/parar el servidor cuantas
//! veces haga falta. Cada test usa su propio directorio de estáticos y
//! puerto efímero (puerto 0), así que pueden correr en paralelo.

use static_server::config::Config;
use static_server::lifecycle::{LifecycleState, ServerController, StartOutcome, StopOutcome};
use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Directorio temporal único por test (NO se crea: varios tests
/// necesitan arrancar contra un directorio inexistente)
fn temp_root(tag: &str) -> PathBuf {
    let n = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!(
        "static_server_it_{}_{}_{}",
        tag,
        std::process::id(),
        n
    ))
}

/// Controlador de prueba sobre la raíz indicada
fn controller_for(root: &PathBuf) -> ServerController {
    let mut config = Config::default();
    config.static_dir = root.to_string_lossy().into_owned();
    config.shutdown_timeout_ms = 2_000;
    config.restart_settle_ms = 10;
    ServerController::new(&config)
}

/// Arranca en puerto efímero y retorna la dirección real
fn start_server(controller: &ServerController) -> SocketAddr {
    match controller.start(0) {
        StartOutcome::Started { addr, .. } => addr,
        other => panic!("esperaba Started, fue {:?}", other),
    }
}

/// Helper: envía un request crudo y retorna la response completa en bytes
fn send_request_bytes(addr: SocketAddr, raw: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).expect("connect");

    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");
    stream
        .set_write_timeout(Some(Duration::from_secs(5)))
        .expect("write timeout");

    stream.write_all(raw.as_bytes()).expect("write");
    stream
        .shutdown(std::net::Shutdown::Write)
        .expect("shutdown write");

    let mut response = Vec::new();
    stream.read_to_end(&mut response).expect("read");
    response
}

/// Helper: como `send_request_bytes` pero como texto (con pérdida)
fn send_request(addr: SocketAddr, raw: &str) -> String {
    String::from_utf8_lossy(&send_request_bytes(addr, raw)).into_owned()
}

/// Helper: extrae el body de una response HTTP en bytes
fn extract_body(response: &[u8]) -> &[u8] {
    let separator = b"\r\n\r\n";
    response
        .windows(separator.len())
        .position(|w| w == separator)
        .map(|pos| &response[pos + separator.len()..])
        .unwrap_or(b"")
}

/// Helper: extrae el valor de un header de la response
fn header_value<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    let prefix = format!("{}: ", name);
    response
        .lines()
        .find(|line| line.starts_with(&prefix))
        .map(|line| line[prefix.len()..].trim())
}

#[test]
fn test_full_operator_scenario() {
    // Raíz vacía → start → GET / → 200; GET inexistente → 404;
    // stop → no conecta; start de nuevo → sirve igual
    let root = temp_root("scenario");
    let controller = controller_for(&root);

    let addr = start_server(&controller);
    assert_eq!(controller.status(), LifecycleState::Running);

    let response = send_request(addr, "GET / HTTP/1.0\r\n\r\n");
    assert!(response.contains("200 OK"), "got: {}", response);
    assert!(response.contains("Bienvenido"));

    // La población por defecto incluye 404.html, así que el fallback es
    // el personalizado
    let response = send_request(addr, "GET /missing.txt HTTP/1.0\r\n\r\n");
    assert!(response.contains("404 Not Found"));
    assert!(response.contains("404"));

    assert_eq!(controller.stop(), StopOutcome::Stopped);
    assert_eq!(controller.status(), LifecycleState::Stopped);
    assert!(TcpStream::connect(addr).is_err());

    // Segundo arranque: sirve idéntico
    let addr = start_server(&controller);
    let response = send_request(addr, "GET / HTTP/1.0\r\n\r\n");
    assert!(response.contains("200 OK"));
    assert!(response.contains("Bienvenido"));

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_default_population_creates_exactly_two_files() {
    let root = temp_root("population");
    assert!(!root.exists());

    let controller = controller_for(&root);
    let addr = start_server(&controller);

    let entries: Vec<_> = fs::read_dir(&root).expect("leer raíz").collect();
    assert_eq!(entries.len(), 2);
    assert!(!fs::read(root.join("index.html")).unwrap().is_empty());
    assert!(!fs::read(root.join("404.html")).unwrap().is_empty());

    let response = send_request(addr, "GET / HTTP/1.0\r\n\r\n");
    assert!(response.contains("200 OK"));

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_existing_directory_is_not_repopulated() {
    let root = temp_root("no_repopulate");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("index.html"), "<h1>mi portada</h1>").unwrap();

    let controller = controller_for(&root);
    let addr = start_server(&controller);

    // No se agregó ningún 404.html ni se pisó el index
    assert!(!root.join("404.html").exists());
    let response = send_request(addr, "GET / HTTP/1.0\r\n\r\n");
    assert!(response.contains("mi portada"));

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_custom_fallback_served_verbatim() {
    let root = temp_root("custom_fallback");
    fs::create_dir_all(&root).unwrap();
    let custom = "<html><body>pagina 404 del operador</body></html>";
    fs::write(root.join("404.html"), custom).unwrap();

    let controller = controller_for(&root);
    let addr = start_server(&controller);

    let response = send_request_bytes(addr, "GET /missing.txt HTTP/1.0\r\n\r\n");
    let text = String::from_utf8_lossy(&response);
    assert!(text.contains("404 Not Found"));
    assert_eq!(extract_body(&response), custom.as_bytes());

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_generated_fallback_embeds_requested_path() {
    // Directorio pre-existente SIN 404.html: el fallback es el generado
    let root = temp_root("generated_fallback");
    fs::create_dir_all(&root).unwrap();

    let controller = controller_for(&root);
    let addr = start_server(&controller);

    let response = send_request(addr, "GET /missing.txt HTTP/1.0\r\n\r\n");
    assert!(response.contains("404 Not Found"));
    assert!(response.contains("/missing.txt"));
    assert!(response.contains(r#"<a href="/">"#));

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_existing_file_never_falls_back() {
    let root = temp_root("precedence");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("hola.txt"), "contenido real").unwrap();
    fs::write(root.join("404.html"), "no deberia aparecer").unwrap();

    let controller = controller_for(&root);
    let addr = start_server(&controller);

    let response = send_request(addr, "GET /hola.txt HTTP/1.0\r\n\r\n");
    assert!(response.contains("200 OK"));
    assert!(response.contains("contenido real"));
    assert!(!response.contains("no deberia aparecer"));

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_stop_is_idempotent() {
    let root = temp_root("idempotent_stop");
    let controller = controller_for(&root);

    assert_eq!(controller.stop(), StopOutcome::NotRunning);
    assert_eq!(controller.stop(), StopOutcome::NotRunning);
    assert_eq!(controller.status(), LifecycleState::Stopped);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_second_start_is_rejected_without_side_effects() {
    let root = temp_root("double_start");
    let controller = controller_for(&root);

    let addr = start_server(&controller);
    assert!(matches!(controller.start(0), StartOutcome::AlreadyRunning));

    // La instancia original sigue sirviendo
    let response = send_request(addr, "GET / HTTP/1.0\r\n\r\n");
    assert!(response.contains("200 OK"));

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_restart_round_trip() {
    let root = temp_root("restart");
    let controller = controller_for(&root);

    start_server(&controller);
    assert_eq!(controller.status(), LifecycleState::Running);

    let (stop_outcome, start_outcome) = controller.restart(0);
    assert_eq!(stop_outcome, StopOutcome::Stopped);

    let addr = match start_outcome {
        StartOutcome::Started { addr, .. } => addr,
        other => panic!("esperaba Started, fue {:?}", other),
    };
    assert_eq!(controller.status(), LifecycleState::Running);

    let response = send_request(addr, "GET / HTTP/1.0\r\n\r\n");
    assert!(response.contains("200 OK"));

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_head_request_has_headers_but_no_body() {
    let root = temp_root("head");
    let controller = controller_for(&root);
    let addr = start_server(&controller);

    let response = send_request_bytes(addr, "HEAD / HTTP/1.0\r\n\r\n");
    let text = String::from_utf8_lossy(&response);

    assert!(text.contains("200 OK"));
    assert!(text.contains("Content-Length:"));
    assert!(extract_body(&response).is_empty());

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_etag_revalidation_returns_304() {
    let root = temp_root("etag");
    let controller = controller_for(&root);
    let addr = start_server(&controller);

    let first = send_request(addr, "GET / HTTP/1.0\r\n\r\n");
    let etag = header_value(&first, "ETag")
        .expect("la primera respuesta debe traer ETag")
        .to_string();

    let raw = format!("GET / HTTP/1.0\r\nIf-None-Match: {}\r\n\r\n", etag);
    let second = send_request_bytes(addr, &raw);
    let text = String::from_utf8_lossy(&second);

    assert!(text.contains("304 Not Modified"));
    assert!(extract_body(&second).is_empty());

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_range_request_returns_slice() {
    let root = temp_root("range");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("datos.bin"), "0123456789").unwrap();

    let controller = controller_for(&root);
    let addr = start_server(&controller);

    let response =
        send_request_bytes(addr, "GET /datos.bin HTTP/1.0\r\nRange: bytes=2-5\r\n\r\n");
    let text = String::from_utf8_lossy(&response);

    assert!(text.contains("206 Partial Content"));
    assert!(text.contains("Content-Range: bytes 2-5/10"));
    assert_eq!(extract_body(&response), b"2345");

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_gzip_when_negotiated() {
    let root = temp_root("gzip");
    let controller = controller_for(&root);
    let addr = start_server(&controller);

    let response = send_request_bytes(
        addr,
        "GET / HTTP/1.0\r\nAccept-Encoding: gzip\r\n\r\n",
    );
    let text = String::from_utf8_lossy(&response);
    assert!(text.contains("200 OK"));
    assert!(text.contains("Content-Encoding: gzip"));

    // El body descomprimido es la página principal
    let mut decoder = flate2::read::GzDecoder::new(extract_body(&response));
    let mut decompressed = String::new();
    decoder.read_to_string(&mut decompressed).expect("gunzip");
    assert!(decompressed.contains("Bienvenido"));

    // Sin Accept-Encoding no hay compresión
    let plain = send_request(addr, "GET / HTTP/1.0\r\n\r\n");
    assert!(!plain.contains("Content-Encoding:"));

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

#[test]
fn test_traversal_paths_are_not_served() {
    let root = temp_root("traversal");
    fs::create_dir_all(&root).unwrap();

    let controller = controller_for(&root);
    let addr = start_server(&controller);

    let response = send_request(addr, "GET /../Cargo.toml HTTP/1.0\r\n\r\n");
    assert!(response.contains("404 Not Found"));
    assert!(!response.contains("[package]"));

    // También con los puntos escapados
    let response = send_request(addr, "GET /%2e%2e/Cargo.toml HTTP/1.0\r\n\r\n");
    assert!(response.contains("404 Not Found"));
    assert!(!response.contains("[package]"));

    controller.stop();
    let _ = fs::remove_dir_all(root);
}

//! # Instancia TCP del Servidor
//! src/server/tcp.rs
//!
//! Implementación de la instancia que escucha en un puerto y atiende
//! conexiones, una por thread. El accept loop corre en su propio thread
//! en modo no bloqueante para poder observar la bandera de apagado; cada
//! conexión aceptada vuelve a modo bloqueante con timeouts.
//!
//! El apagado ordenado tiene dos fases:
//! 1. Se levanta la bandera y se espera a que el accept loop termine
//!    (esto cierra el listener: nuevas conexiones son rechazadas)
//! 2. Se espera, con un tope de tiempo, a que las conexiones en vuelo
//!    terminen (el contador de conexiones activas llega a cero)

use crate::files;
use crate::http::{Method, Request, Response, StatusCode};
use crate::lifecycle::SharedSlot;
use crate::resolver::{Resolution, Resolver};
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

/// Frecuencia con la que el accept loop revisa la bandera de apagado
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Timeout de lectura/escritura por conexión
const CLIENT_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Estado compartido entre el handle, el accept loop y las conexiones
struct ServerShared {
    /// Bandera de apagado: el accept loop termina al verla levantada
    shutdown: AtomicBool,

    /// Conexiones actualmente siendo atendidas
    active_connections: Mutex<u64>,

    /// Se notifica cuando el contador de conexiones llega a cero
    drained: Condvar,
}

/// Instancia activa del servidor, enlazada a un puerto
///
/// Existe a lo sumo una a la vez: es propiedad exclusiva del slot del
/// controlador de ciclo de vida. Se crea con [`ServerHandle::launch`] y
/// se destruye vía `shutdown` (o al vaciarse el slot tras un error
/// fatal del listener).
pub struct ServerHandle {
    /// Dirección real en la que quedó escuchando
    addr: SocketAddr,

    /// Generación asignada por el controlador al crear este handle
    generation: u64,

    shared: Arc<ServerShared>,

    /// Thread del accept loop (se le hace join durante el apagado)
    accept_thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Arranca el servido sobre un listener ya enlazado
    ///
    /// El listener llega enlazado porque el bind es responsabilidad del
    /// controlador: así los errores de puerto ocupado se reportan en el
    /// `start` y nunca después. El servido en sí es asíncrono: esta
    /// función retorna apenas el accept loop queda corriendo.
    pub(crate) fn launch(
        listener: TcpListener,
        resolver: Arc<Resolver>,
        slot: SharedSlot,
        generation: u64,
    ) -> std::io::Result<ServerHandle> {
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let shared = Arc::new(ServerShared {
            shutdown: AtomicBool::new(false),
            active_connections: Mutex::new(0),
            drained: Condvar::new(),
        });

        let accept_shared = Arc::clone(&shared);
        let accept_thread = thread::spawn(move || {
            accept_loop(listener, resolver, accept_shared, slot, generation);
        });

        Ok(Self {
            addr,
            generation,
            shared,
            accept_thread: Some(accept_thread),
        })
    }

    /// Dirección real en la que escucha la instancia
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Generación con la que el controlador registró este handle
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Apagado ordenado con espera acotada
    ///
    /// Cierra el listener y espera hasta `timeout` a que las conexiones
    /// en vuelo terminen. Retorna `true` si el drenado completó dentro
    /// del tope; `false` si se abandonó la espera (las conexiones
    /// restantes pueden quedar cortadas).
    pub(crate) fn shutdown(&mut self, timeout: Duration) -> bool {
        self.shared.shutdown.store(true, Ordering::SeqCst);

        // 1. El accept loop observa la bandera en su próximo ciclo;
        //    al terminar, el listener se cierra
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }

        // 2. Esperar el drenado de conexiones activas
        let guard = self.shared.active_connections.lock().unwrap();
        let (guard, _result) = self
            .shared
            .drained
            .wait_timeout_while(guard, timeout, |active| *active > 0)
            .unwrap();

        *guard == 0
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        // Si el handle se descarta sin pasar por shutdown() (por ejemplo
        // al vaciarse el slot tras un error fatal), el accept loop
        // igualmente debe terminar
        self.shared.shutdown.store(true, Ordering::SeqCst);
    }
}

/// Loop de aceptación de conexiones
///
/// Corre hasta que se levanta la bandera de apagado o el listener falla
/// con un error fatal. En el caso fatal, vacía el slot del controlador
/// (solo si todavía contiene esta generación) para que un `start`
/// posterior pueda volver a arrancar.
fn accept_loop(
    listener: TcpListener,
    resolver: Arc<Resolver>,
    shared: Arc<ServerShared>,
    slot: SharedSlot,
    generation: u64,
) {
    loop {
        if shared.shutdown.load(Ordering::SeqCst) {
            break;
        }

        match listener.accept() {
            Ok((stream, _peer)) => {
                // El stream aceptado vuelve a modo bloqueante con timeouts
                let _ = stream.set_nonblocking(false);
                let _ = stream.set_read_timeout(Some(CLIENT_IO_TIMEOUT));
                let _ = stream.set_write_timeout(Some(CLIENT_IO_TIMEOUT));

                {
                    let mut active = shared.active_connections.lock().unwrap();
                    *active += 1;
                }

                let conn_shared = Arc::clone(&shared);
                let conn_resolver = Arc::clone(&resolver);

                thread::spawn(move || {
                    if let Err(e) = handle_connection(stream, &conn_resolver) {
                        eprintln!("❌ Error atendiendo conexión: {}", e);
                    }

                    let mut active = conn_shared.active_connections.lock().unwrap();
                    *active -= 1;
                    if *active == 0 {
                        conn_shared.drained.notify_all();
                    }
                });
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                eprintln!("❌ Error fatal del servidor: {}", e);

                // try_lock: si una operación de ciclo de vida tiene el
                // lock, ella misma va a vaciar o reemplazar el slot
                if let Ok(mut slot) = slot.try_lock() {
                    if slot.handle.as_ref().map(|h| h.generation()) == Some(generation) {
                        slot.handle = None;
                    }
                }
                break;
            }
        }
    }
}

/// Atiende una conexión: lee el request, resuelve y responde
fn handle_connection(mut stream: TcpStream, resolver: &Resolver) -> std::io::Result<()> {
    let mut buffer = [0u8; 8192];
    let bytes_read = stream.read(&mut buffer)?;

    if bytes_read == 0 {
        // El peer cerró sin mandar nada
        return Ok(());
    }

    let mut response = match Request::parse(&buffer[..bytes_read]) {
        Ok(request) => dispatch(&request, resolver),
        Err(e) => Response::error(StatusCode::BadRequest, &format!("Invalid: {}", e)),
    };

    // Headers comunes a todas las respuestas
    response.add_header("Server", "RedUnix-Static/1.0");
    response.add_header("Connection", "close");

    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    Ok(())
}

/// Decide la respuesta para un request ya parseado
fn dispatch(request: &Request, resolver: &Resolver) -> Response {
    // Servidor de archivos: solo GET y HEAD
    if request.method() == Method::POST {
        let mut response = Response::error(
            StatusCode::MethodNotAllowed,
            "Only GET and HEAD are supported",
        );
        response.add_header("Allow", "GET, HEAD");
        return response;
    }

    let head = request.method() == Method::HEAD;

    match resolver.resolve(request.path()) {
        Resolution::ServeFile(path) => files::serve_file(&path, request),
        Resolution::ServeCustom404(path) => {
            files::serve_fallback_file(&path, request.path(), head)
        }
        Resolution::ServeDefault404 => files::serve_default_not_found(request.path(), head),
    }
}

//! # Controlador de Ciclo de Vida
//! src/lifecycle/mod.rs
//!
//! Este módulo implementa la máquina de estados que gobierna el arranque
//! y apagado del servidor:
//!
//! ```text
//! Stopped --start--> Running --stop--> Stopped
//! ```
//!
//! El estado completo es un único slot opcional con el handle del
//! servidor, protegido por un mutex. Todas las operaciones (consola,
//! señal, y el propio camino de error del servidor) pasan por ese lock,
//! así que nunca puede haber dos instancias a la vez.
//!
//! ## Decisiones de concurrencia
//!
//! - El lock se mantiene durante TODO el `stop()`, incluida la espera de
//!   drenado (peor caso: el timeout completo, 5 s por defecto). Esto
//!   serializa las operaciones de ciclo de vida entre sí. Con un único
//!   operador la frecuencia de operaciones es bajísima y la simplicidad
//!   gana.
//! - El bind es síncrono: ocurre dentro de `start()` y un puerto ocupado
//!   se reporta en el valor de retorno, no por un canal lateral. El
//!   único fallo asíncrono restante es un error fatal del accept loop,
//!   que vacía el slot él mismo (verificando la generación para no pisar
//!   un handle más nuevo).
//! - `restart` NO es atómico: entre su `stop` y su `start` el slot queda
//!   vacío un instante y un `start` concurrente puede ganarle el lugar.
//!   En ese caso el `start` interno del restart reporta "ya corriendo".
//!   Es una propiedad documentada del diseño, no un bug.

use crate::config::Config;
use crate::files;
use crate::resolver::Resolver;
use crate::server::ServerHandle;
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Contenido del slot compartido: el handle (si hay servidor corriendo)
/// y la generación del último arranque
pub(crate) struct Slot {
    /// Handle de la instancia activa, o `None` si está detenido
    pub(crate) handle: Option<ServerHandle>,

    /// Se incrementa en cada arranque exitoso; permite que el camino de
    /// error del accept loop no vacíe un handle que no es el suyo
    pub(crate) generation: u64,
}

impl Slot {
    /// Slot inicial: sin servidor y generación cero
    pub(crate) fn empty() -> Self {
        Self {
            handle: None,
            generation: 0,
        }
    }
}

/// El slot protegido que comparten controlador y accept loop
pub(crate) type SharedSlot = Arc<Mutex<Slot>>;

/// Estado observable del ciclo de vida
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Hay una instancia escuchando
    Running,

    /// No hay instancia
    Stopped,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Running => write!(f, "Running"),
            LifecycleState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Resultado de un `start`
#[derive(Debug)]
pub enum StartOutcome {
    /// El servidor quedó escuchando en `addr`
    Started {
        /// Dirección real (útil con puerto 0)
        addr: SocketAddr,

        /// Si esta llamada creó la raíz de estáticos con su contenido
        /// por defecto
        site_created: bool,
    },

    /// Ya había una instancia corriendo; no se hizo nada
    AlreadyRunning,

    /// El bind falló (típicamente puerto ocupado); el slot quedó vacío
    BindError(std::io::Error),
}

/// Resultado de un `stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Apagado ordenado completo: las conexiones en vuelo terminaron
    Stopped,

    /// Se agotó la espera de drenado; el slot se vació de todas formas
    /// y las conexiones restantes pueden haber quedado cortadas
    StoppedWithTimeout,

    /// No había instancia corriendo
    NotRunning,
}

/// Controlador del ciclo de vida del servidor
///
/// Es el único dueño del slot de instancia. Se construye una vez en el
/// arranque del proceso y se comparte (vía `Arc`) entre la consola y el
/// manejador de señales.
pub struct ServerController {
    slot: SharedSlot,
    host: String,
    static_root: PathBuf,
    shutdown_timeout: Duration,
    restart_settle: Duration,
}

impl ServerController {
    /// Crea el controlador a partir de la configuración
    pub fn new(config: &Config) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::empty())),
            host: config.host.clone(),
            static_root: PathBuf::from(&config.static_dir),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
            restart_settle: Duration::from_millis(config.restart_settle_ms),
        }
    }

    /// Arranca el servidor en el puerto indicado
    ///
    /// Si ya hay una instancia corriendo no tiene ningún efecto y
    /// reporta [`StartOutcome::AlreadyRunning`]. Si la raíz de estáticos
    /// no existe, la crea con contenido por defecto antes de enlazar el
    /// puerto. El servido es asíncrono: esta función retorna apenas la
    /// instancia queda registrada.
    pub fn start(&self, port: u16) -> StartOutcome {
        let mut slot = self.slot.lock().unwrap();

        if slot.handle.is_some() {
            return StartOutcome::AlreadyRunning;
        }

        // Población por defecto, best-effort: un fallo se reporta pero
        // no bloquea el arranque
        let site_created = match files::ensure_default_site(&self.static_root) {
            Ok(created) => created,
            Err(e) => {
                eprintln!(
                    "⚠️  No se pudo preparar el directorio de estáticos {}: {}",
                    self.static_root.display(),
                    e
                );
                false
            }
        };

        // Bind síncrono: el puerto ocupado se reporta acá mismo
        let address = format!("{}:{}", self.host, port);
        let listener = match TcpListener::bind(&address) {
            Ok(listener) => listener,
            Err(e) => return StartOutcome::BindError(e),
        };

        slot.generation += 1;
        let generation = slot.generation;
        let resolver = Arc::new(Resolver::new(self.static_root.clone()));

        match ServerHandle::launch(listener, resolver, Arc::clone(&self.slot), generation) {
            Ok(handle) => {
                let addr = handle.addr();
                slot.handle = Some(handle);
                StartOutcome::Started { addr, site_created }
            }
            Err(e) => StartOutcome::BindError(e),
        }
    }

    /// Detiene el servidor con apagado ordenado
    ///
    /// Espera hasta el timeout configurado (5 s por defecto) a que las
    /// conexiones en vuelo terminen. El slot queda vacío SIEMPRE, aun si
    /// la espera se agota: un handle "drenando para siempre" no puede
    /// quedar registrado.
    ///
    /// El lock del slot se mantiene durante toda la operación, así que
    /// un `start`/`status` concurrente espera a que el stop termine.
    pub fn stop(&self) -> StopOutcome {
        let mut slot = self.slot.lock().unwrap();

        let mut handle = match slot.handle.take() {
            Some(handle) => handle,
            None => return StopOutcome::NotRunning,
        };

        if handle.shutdown(self.shutdown_timeout) {
            StopOutcome::Stopped
        } else {
            StopOutcome::StoppedWithTimeout
        }
    }

    /// Reinicia el servidor: `stop`, una pausa breve para que el SO
    /// libere el puerto, y `start`
    ///
    /// No es atómico: el slot queda vacío entre las dos mitades y un
    /// `start` externo concurrente puede instalarse en ese hueco (el
    /// `start` de este restart reportará entonces `AlreadyRunning`).
    pub fn restart(&self, port: u16) -> (StopOutcome, StartOutcome) {
        let stop_outcome = self.stop();
        thread::sleep(self.restart_settle);
        (stop_outcome, self.start(port))
    }

    /// Estado actual: `Running` si el slot tiene un handle
    ///
    /// Solo toma el lock para la consulta.
    pub fn status(&self) -> LifecycleState {
        if self.slot.lock().unwrap().handle.is_some() {
            LifecycleState::Running
        } else {
            LifecycleState::Stopped
        }
    }
}

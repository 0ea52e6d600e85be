//! # Static Server
//! src/lib.rs
//!
//! Servidor de archivos estáticos HTTP/1.0 controlado por una consola
//! interactiva: los comandos `start`, `stop`, `restart` y `status`
//! gobiernan una única instancia embebida que sirve archivos desde un
//! directorio local, con página 404 de respaldo cuando el path pedido
//! no existe.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Parsing y manejo del protocolo HTTP/1.0
//! - `server`: Instancia TCP y manejo de conexiones
//! - `lifecycle`: Máquina de estados start/stop/restart (el único dueño
//!   de la instancia)
//! - `resolver`: Decisión por request entre archivo, 404 personalizado y
//!   404 generado
//! - `files`: Servido de archivos con ETags, rangos y gzip, y contenido
//!   por defecto
//! - `console`: Loop de comandos del operador
//! - `config`: Configuración por CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```
//! use static_server::config::Config;
//! use static_server::lifecycle::ServerController;
//!
//! let config = Config::default();
//! let controller = ServerController::new(&config);
//! // La consola o el manejador de señales invocan
//! // controller.start(...) / controller.stop() / controller.status()
//! ```

pub mod config;
pub mod console;
pub mod files;
pub mod http;
pub mod lifecycle;
pub mod resolver;
pub mod server;

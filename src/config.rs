//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define la configuración del servidor de estáticos con
//! soporte completo para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./static_server --port 8080 \
//!   --static-dir ./static \
//!   --shutdown-timeout 5000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 ./static_server
//! ```

use clap::Parser;

/// Configuración del servidor de archivos estáticos
#[derive(Debug, Clone, Parser)]
#[command(name = "static_server")]
#[command(about = "Servidor de archivos estáticos HTTP/1.0 con consola de control")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto por defecto para los comandos start/restart de la consola
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Directorio raíz de los archivos servidos
    #[arg(long = "static-dir", default_value = "./static", env = "STATIC_DIR")]
    pub static_dir: String,

    // === Timeouts ===

    /// Espera máxima del apagado ordenado en milisegundos
    #[arg(long = "shutdown-timeout", default_value = "5000", env = "SHUTDOWN_TIMEOUT_MS")]
    pub shutdown_timeout_ms: u64,

    /// Pausa entre el stop y el start de un restart en milisegundos
    /// (le da tiempo al SO a liberar el puerto)
    #[arg(long = "restart-settle", default_value = "100", env = "RESTART_SETTLE_MS")]
    pub restart_settle_ms: u64,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use static_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address_for(3000), "127.0.0.1:3000");
    /// ```
    pub fn address_for(&self, port: u16) -> String {
        format!("{}:{}", self.host, port)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("Host must not be empty".to_string());
        }

        if self.static_dir.trim().is_empty() {
            return Err("Static dir must not be empty".to_string());
        }

        if self.shutdown_timeout_ms == 0 {
            return Err("Shutdown timeout must be > 0".to_string());
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║          RedUnix Static File Server Configuration            ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:           {}", self.address_for(self.port));
        println!("   Static dir:        {}", self.static_dir);
        println!();
        println!("⏱️  Lifecycle:");
        println!("   Shutdown timeout:  {} ms", self.shutdown_timeout_ms);
        println!("   Restart settle:    {} ms", self.restart_settle_ms);
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            static_dir: "./static".to_string(),
            shutdown_timeout_ms: 5_000,
            restart_settle_ms: 100,
        }
    }
}

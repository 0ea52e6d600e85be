//! # Consola de Control
//! src/console/mod.rs
//!
//! Loop interactivo que lee comandos de stdin y los traduce a
//! operaciones del controlador de ciclo de vida:
//!
//! ```text
//! stdin → Command::parse → ServerController → salida por consola
//! ```
//!
//! Comandos soportados: `start [puerto]`, `stop`, `restart [puerto]`,
//! `status`, `help` y `exit`. La entrada no reconocida se reporta sin
//! cambiar ningún estado.

use crate::lifecycle::{ServerController, StartOutcome, StopOutcome};
use std::io::{self, BufRead, Write};

/// Comando de consola ya parseado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Arrancar el servidor (puerto opcional)
    Start(Option<u16>),

    /// Detener el servidor
    Stop,

    /// Reiniciar el servidor (puerto opcional)
    Restart(Option<u16>),

    /// Consultar el estado
    Status,

    /// Mostrar la ayuda
    Help,

    /// Detener el servidor y salir del proceso
    Exit,
}

/// Errores al parsear una línea de la consola
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Línea vacía (se ignora en silencio)
    Empty,

    /// Comando no reconocido
    Unknown(String),

    /// El argumento de puerto no es un número válido
    InvalidPort(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Empty => write!(f, "Empty command"),
            CommandError::Unknown(input) => write!(
                f,
                "❌ Comando desconocido: '{}'. Escriba 'help' para ver los comandos",
                input
            ),
            CommandError::InvalidPort(arg) => {
                write!(f, "❌ Puerto inválido: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for CommandError {}

impl Command {
    /// Parsea una línea de consola
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::console::Command;
    ///
    /// assert_eq!(Command::parse("start 9000"), Ok(Command::Start(Some(9000))));
    /// assert_eq!(Command::parse("status"), Ok(Command::Status));
    /// assert!(Command::parse("arrancame").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Command, CommandError> {
        let parts: Vec<&str> = input.split_whitespace().collect();

        if parts.is_empty() {
            return Err(CommandError::Empty);
        }

        match parts[0] {
            "start" => Ok(Command::Start(Self::parse_port(parts.get(1))?)),
            "stop" => Ok(Command::Stop),
            "restart" => Ok(Command::Restart(Self::parse_port(parts.get(1))?)),
            "status" => Ok(Command::Status),
            "help" => Ok(Command::Help),
            "exit" => Ok(Command::Exit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    /// Parsea el argumento opcional de puerto
    fn parse_port(arg: Option<&&str>) -> Result<Option<u16>, CommandError> {
        match arg {
            None => Ok(None),
            Some(s) => s
                .parse::<u16>()
                .map(Some)
                .map_err(|_| CommandError::InvalidPort((*s).to_string())),
        }
    }
}

/// Loop principal de la consola
///
/// Lee líneas de stdin hasta EOF o hasta el comando `exit`. Ningún
/// error de comando corta el loop: se reporta y se sigue leyendo.
pub fn run(controller: &ServerController, default_port: u16) {
    let stdin = io::stdin();

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            // EOF: igual que exit
            Ok(0) => {
                controller.stop();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("❌ Error leyendo la entrada: {}", e);
                continue;
            }
        }

        match Command::parse(&line) {
            Ok(command) => {
                if execute(controller, command, default_port) {
                    break;
                }
            }
            Err(CommandError::Empty) => continue,
            Err(e) => println!("{}", e),
        }
    }
}

/// Ejecuta un comando ya parseado e imprime el resultado
///
/// Retorna `true` si la consola debe terminar (comando `exit`).
pub fn execute(controller: &ServerController, command: Command, default_port: u16) -> bool {
    match command {
        Command::Start(port) => {
            print_start_outcome(controller.start(port.unwrap_or(default_port)));
        }
        Command::Stop => {
            print_stop_outcome(controller.stop());
        }
        Command::Restart(port) => {
            println!("🔄 Reiniciando el servidor...");
            let (stop_outcome, start_outcome) =
                controller.restart(port.unwrap_or(default_port));
            print_stop_outcome(stop_outcome);
            print_start_outcome(start_outcome);
        }
        Command::Status => {
            println!("{}", controller.status());
        }
        Command::Help => {
            print_help(default_port);
        }
        Command::Exit => {
            controller.stop();
            println!("👋 Hasta luego");
            return true;
        }
    }

    false
}

fn print_start_outcome(outcome: StartOutcome) {
    match outcome {
        StartOutcome::Started { addr, site_created } => {
            if site_created {
                println!("📁 Directorio de estáticos creado con contenido por defecto");
            }
            println!("✅ Servidor iniciado en http://{}", addr);
        }
        StartOutcome::AlreadyRunning => {
            println!("⚠️  El servidor ya está corriendo");
        }
        StartOutcome::BindError(e) => {
            println!("❌ No se pudo enlazar el puerto: {}", e);
        }
    }
}

fn print_stop_outcome(outcome: StopOutcome) {
    match outcome {
        StopOutcome::Stopped => {
            println!("✅ Servidor detenido");
        }
        StopOutcome::StoppedWithTimeout => {
            println!("⚠️  Se agotó la espera de conexiones activas; el servidor se descartó de todas formas");
        }
        StopOutcome::NotRunning => {
            println!("⚠️  El servidor no está corriendo");
        }
    }
}

fn print_help(default_port: u16) {
    println!("Comandos disponibles:");
    println!("  start [puerto]   - arranca el servidor (puerto por defecto {})", default_port);
    println!("  stop             - detiene el servidor");
    println!("  restart [puerto] - reinicia el servidor");
    println!("  status           - estado del servidor");
    println!("  help             - esta ayuda");
    println!("  exit             - detiene el servidor y sale");
}

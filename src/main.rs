//! # Static Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor de archivos estáticos.
//!
//! Construye el controlador de ciclo de vida, instala el manejador de
//! señales y entra al loop de la consola. El servidor NO arranca solo:
//! el operador decide cuándo con el comando `start`.

use static_server::config::Config;
use static_server::console;
use static_server::lifecycle::ServerController;
use std::sync::Arc;

fn main() {
    println!("=================================");
    println!("  RedUnix Static File Server");
    println!("  Consola de control");
    println!("=================================\n");

    // Crear configuración desde CLI y variables de entorno
    let config = Config::new();

    if let Err(e) = config.validate() {
        eprintln!("💥 Configuración inválida: {}", e);
        std::process::exit(1);
    }

    config.print_summary();

    // El controlador se construye una sola vez y se comparte entre la
    // consola y el manejador de señales
    let controller = Arc::new(ServerController::new(&config));

    // Ctrl+C / SIGTERM: mismo camino de apagado que el comando stop,
    // serializado por el lock del controlador
    {
        let controller = Arc::clone(&controller);
        ctrlc::set_handler(move || {
            println!("\n🛑 Señal recibida, deteniendo el servidor...");
            controller.stop();
            std::process::exit(0);
        })
        .expect("No se pudo instalar el manejador de señales");
    }

    println!("Escriba 'help' para ver los comandos disponibles\n");

    console::run(&controller, config.port);
}

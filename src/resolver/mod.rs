//! # Resolución de Peticiones
//! src/resolver/mod.rs
//!
//! Este módulo decide, para cada path pedido, qué se responde:
//!
//! ```text
//! Path → Resolver → ServeFile | ServeCustom404 | ServeDefault404
//! ```
//!
//! La decisión es puramente una consulta al árbol de archivos:
//!
//! 1. `/` se traduce a la página principal (`index.html`)
//! 2. Si el archivo existe, se sirve
//! 3. Si no existe pero hay un `404.html` en la raíz, se sirve ese
//!    contenido con status 404
//! 4. Si tampoco hay `404.html`, se genera una página 404 por defecto
//!
//! Los paths que intentan escapar de la raíz (`..`) se tratan como
//! inexistentes. El listado de directorios está deshabilitado: un
//! directorio sin archivo pedido explícitamente también cae al 404.

use std::path::{Path, PathBuf};

/// Nombre de la página principal dentro de la raíz de estáticos
pub const HOME_PAGE: &str = "index.html";

/// Nombre de la página 404 personalizada dentro de la raíz de estáticos
pub const FALLBACK_PAGE: &str = "404.html";

/// Decisión tomada para un path pedido
///
/// Es un valor efímero: se calcula por request y no se persiste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// El archivo existe: servirlo desde esta ruta
    ServeFile(PathBuf),

    /// El archivo no existe pero hay 404.html personalizado: servir su
    /// contenido tal cual con status 404
    ServeCustom404(PathBuf),

    /// No existe ni el archivo ni 404.html: generar la página 404 por
    /// defecto
    ServeDefault404,
}

/// Resuelve paths de peticiones contra la raíz de archivos estáticos
pub struct Resolver {
    /// Raíz del árbol de archivos servidos
    root: PathBuf,
}

impl Resolver {
    /// Crea un resolver sobre la raíz indicada
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Obtiene la raíz de estáticos que usa este resolver
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decide la respuesta para un path de request
    ///
    /// # Ejemplo
    /// ```
    /// use std::path::PathBuf;
    /// use static_server::resolver::{Resolution, Resolver};
    ///
    /// let resolver = Resolver::new(PathBuf::from("/directorio/inexistente"));
    /// assert_eq!(resolver.resolve("/nada.txt"), Resolution::ServeDefault404);
    /// ```
    pub fn resolve(&self, request_path: &str) -> Resolution {
        // 1. Normalizar el caso raíz: "/" es la página principal
        let target = if request_path == "/" {
            self.root.join(HOME_PAGE)
        } else {
            match self.sanitize(request_path) {
                Some(path) => path,
                None => return self.missing(),
            }
        };

        // 2. Chequeo de existencia; los directorios cuentan como ausentes
        //    (listado deshabilitado)
        if target.is_file() {
            Resolution::ServeFile(target)
        } else {
            self.missing()
        }
    }

    /// Decide entre el 404 personalizado y el generado
    fn missing(&self) -> Resolution {
        let fallback = self.root.join(FALLBACK_PAGE);
        if fallback.is_file() {
            Resolution::ServeCustom404(fallback)
        } else {
            Resolution::ServeDefault404
        }
    }

    /// Convierte el path del request en una ruta dentro de la raíz
    ///
    /// Retorna `None` para paths que no pueden mapearse a un archivo:
    /// segmentos `..`, backslashes o paths que quedan vacíos tras
    /// limpiarlos. `None` se trata igual que un archivo inexistente.
    fn sanitize(&self, request_path: &str) -> Option<PathBuf> {
        if request_path.contains('\\') {
            return None;
        }

        let mut clean = PathBuf::new();
        for segment in request_path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return None,
                other => clean.push(other),
            }
        }

        if clean.as_os_str().is_empty() {
            return None;
        }

        Some(self.root.join(clean))
    }
}

/// Genera la página 404 por defecto para un path pedido
///
/// El path se incrusta escapado en el HTML, con un enlace de vuelta a la
/// página principal.
pub fn default_not_found_page(request_path: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>404 Not Found</title>
    <style>
        body {{
            font-family: Arial, sans-serif;
            text-align: center;
            padding: 50px;
            background-color: #f5f5f5;
        }}
        .error-container {{
            background: white;
            padding: 40px;
            border-radius: 10px;
            box-shadow: 0 0 10px rgba(0,0,0,0.1);
            display: inline-block;
        }}
        h1 {{ color: #e74c3c; }}
        a {{
            color: #3498db;
            text-decoration: none;
        }}
        a:hover {{ text-decoration: underline; }}
    </style>
</head>
<body>
    <div class="error-container">
        <h1>404</h1>
        <h2>Página no encontrada</h2>
        <p>La URL pedida {} no existe en este servidor.</p>
        <p><a href="/">Volver a la página principal</a></p>
    </div>
</body>
</html>
"#,
        html_escape(request_path)
    )
}

/// Escapa los caracteres especiales de HTML de un texto
///
/// # Ejemplo
/// ```
/// use static_server::resolver::html_escape;
///
/// assert_eq!(html_escape("<script>"), "&lt;script&gt;");
/// ```
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

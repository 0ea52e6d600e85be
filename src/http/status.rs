//! # Códigos de Estado HTTP
//!
//! Este módulo define los códigos de estado HTTP/1.0 que usará el servidor.
//! Según el RFC 1945, HTTP/1.0 define códigos en 5 categorías:
//!
//! - **1xx**: Informacional (no se usan en HTTP/1.0)
//! - **2xx**: Éxito (200 OK, 206 Partial Content)
//! - **3xx**: Redirección (solo 304 Not Modified)
//! - **4xx**: Error del cliente (400, 404, 405, 416)
//! - **5xx**: Error del servidor (500)

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 206 Partial Content - Respuesta a una petición con rango de bytes
    PartialContent = 206,

    /// 304 Not Modified - El recurso no cambió desde la versión cacheada
    NotModified = 304,

    /// 400 Bad Request - Request malformado o inválido
    BadRequest = 400,

    /// 404 Not Found - Ruta o archivo no encontrado
    NotFound = 404,

    /// 405 Method Not Allowed - Método no soportado para este recurso
    MethodNotAllowed = 405,

    /// 416 Range Not Satisfiable - El rango pedido queda fuera del archivo
    RangeNotSatisfiable = 416,

    /// 500 Internal Server Error - Error interno del servidor
    InternalServerError = 500,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// Estos textos están definidos en el RFC 1945 y son estándares.
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::PartialContent => "Partial Content",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::RangeNotSatisfiable => "Range Not Satisfiable",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// Verifica si el código indica éxito (2xx)
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::http::StatusCode;
    /// assert!(StatusCode::Ok.is_success());
    /// assert!(StatusCode::PartialContent.is_success());
    /// assert!(!StatusCode::NotFound.is_success());
    /// ```
    pub fn is_success(&self) -> bool {
        let code = self.as_u16();
        (200..300).contains(&code)
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        let code = self.as_u16();
        (400..500).contains(&code)
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        let code = self.as_u16();
        (500..600).contains(&code)
    }
}

impl std::fmt::Display for StatusCode {
    /// Formatea el código de estado para mostrarlo
    ///
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

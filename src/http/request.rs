//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Este módulo implementa un parser HTTP/1.0 desde cero.
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! GET /css/main.css HTTP/1.0\r\n
//! Host: localhost:8080\r\n
//! User-Agent: curl/7.68.0\r\n
//! \r\n
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path?query HTTP/1.0`
//! 2. **Headers**: Pares `Name: Value` (uno por línea)
//! 3. **Empty Line**: `\r\n` que separa headers del body
//!
//! El path llega percent-decodificado (`%20` → espacio, etc.) porque los
//! nombres de archivo en disco no llevan escapes.

use std::collections::HashMap;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un recurso
    GET,

    /// HEAD - Como GET pero solo retorna headers
    HEAD,

    /// POST - Se parsea pero el servidor de archivos responde 405
    POST,
}

impl Method {
    /// Parsea un método HTTP desde un string
    ///
    /// # Errores
    ///
    /// Retorna error si el método no es soportado
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
        }
    }
}

/// Representa un request HTTP/1.0 parseado
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP (GET, HEAD, POST)
    method: Method,

    /// Path de la petición, ya decodificado (ej: "/img/mi logo.png")
    path: String,

    /// Query parameters parseados (ej: {"v": "2"})
    query_params: HashMap<String, String>,

    /// Headers HTTP (ej: {"Host": "localhost:8080"})
    headers: HashMap<String, String>,

    /// Versión HTTP ("HTTP/1.0" o "HTTP/1.1")
    version: String,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Request incompleto o truncado
    IncompleteRequest,

    /// Formato inválido de la request line
    InvalidRequestLine,

    /// Método HTTP no soportado
    UnsupportedMethod(String),

    /// Versión HTTP incorrecta (debe ser HTTP/1.0 o HTTP/1.1)
    InvalidHttpVersion(String),

    /// Header malformado
    InvalidHeader(String),

    /// Request vacío
    EmptyRequest,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncompleteRequest => write!(f, "Incomplete HTTP request"),
            ParseError::InvalidRequestLine => write!(f, "Invalid request line format"),
            ParseError::UnsupportedMethod(m) => write!(f, "Unsupported HTTP method: {}", m),
            ParseError::InvalidHttpVersion(v) => write!(f, "Invalid HTTP version: {}", v),
            ParseError::InvalidHeader(h) => write!(f, "Invalid header: {}", h),
            ParseError::EmptyRequest => write!(f, "Empty request"),
        }
    }
}

impl std::error::Error for ParseError {}

impl Request {
    /// Parsea un request HTTP/1.0 desde bytes
    ///
    /// # Argumentos
    ///
    /// * `buffer` - Buffer conteniendo el request HTTP completo
    ///
    /// # Retorna
    ///
    /// * `Ok(Request)` - Request parseado exitosamente
    /// * `Err(ParseError)` - Error durante el parsing
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use static_server::http::Request;
    ///
    /// let raw = b"GET /docs/manual.pdf HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/docs/manual.pdf");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        // Convertir a string (validando que sea UTF-8 válido)
        let request_str = std::str::from_utf8(buffer)
            .map_err(|_| ParseError::InvalidRequestLine)?;

        if request_str.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        // Separar por \r\n para obtener líneas
        let lines: Vec<&str> = request_str.split("\r\n").collect();

        if lines.is_empty() {
            return Err(ParseError::IncompleteRequest);
        }

        // 1. Parsear la request line (primera línea)
        let (method, path, query_params, version) = Self::parse_request_line(lines[0])?;

        // 2. Parsear headers (resto de líneas hasta encontrar línea vacía)
        let headers = Self::parse_headers(&lines[1..])?;

        Ok(Request {
            method,
            path,
            query_params,
            headers,
            version,
        })
    }

    /// Parsea la request line (primera línea del request)
    ///
    /// Formato: `GET /path?query HTTP/1.0`
    fn parse_request_line(line: &str) -> Result<(Method, String, HashMap<String, String>, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        // Debe tener exactamente 3 partes: METHOD PATH VERSION
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        // Parsear método
        let method = Method::from_str(parts[0])?;

        // Parsear path y query
        let (path, query_params) = Self::parse_path_and_query(parts[1]);

        // Validar versión HTTP
        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, path, query_params, version))
    }

    /// Parsea el path y extrae los query parameters
    ///
    /// Ejemplo: "/img/logo.png?v=2"
    /// Retorna: ("/img/logo.png", {"v": "2"})
    fn parse_path_and_query(path_with_query: &str) -> (String, HashMap<String, String>) {
        // Buscar el símbolo '?' que separa path de query
        if let Some(query_start) = path_with_query.find('?') {
            let path = Self::percent_decode(&path_with_query[..query_start]);
            let query_string = &path_with_query[query_start + 1..];
            let query_params = Self::parse_query_string(query_string);
            (path, query_params)
        } else {
            // No hay query parameters
            (Self::percent_decode(path_with_query), HashMap::new())
        }
    }

    /// Parsea una query string en un HashMap
    ///
    /// Ejemplo: "v=2&download=true"
    /// Retorna: {"v": "2", "download": "true"}
    fn parse_query_string(query: &str) -> HashMap<String, String> {
        let mut params = HashMap::new();

        // Separar por '&' para obtener cada parámetro
        for param in query.split('&') {
            if param.is_empty() {
                continue;
            }

            // Separar por '=' para obtener key y value
            if let Some(eq_pos) = param.find('=') {
                let key = &param[..eq_pos];
                let value = &param[eq_pos + 1..];

                // En la query, '+' también representa espacio
                let decoded_value = Self::percent_decode(&value.replace('+', " "));

                params.insert(key.to_string(), decoded_value);
            } else {
                // Parámetro sin valor (ej: "?debug")
                params.insert(param.to_string(), String::new());
            }
        }

        params
    }

    /// Decodifica escapes percent (`%XX`) de un componente de URL
    ///
    /// Las secuencias inválidas (un '%' sin dos dígitos hex) se dejan tal
    /// cual. En el path el '+' NO se traduce a espacio; eso solo aplica en
    /// la query string.
    fn percent_decode(s: &str) -> String {
        let bytes = s.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] == b'%' && i + 3 <= bytes.len() {
                if let (Some(hi), Some(lo)) = (Self::hex_value(bytes[i + 1]), Self::hex_value(bytes[i + 2])) {
                    out.push(hi * 16 + lo);
                    i += 3;
                    continue;
                }
            }
            out.push(bytes[i]);
            i += 1;
        }

        String::from_utf8_lossy(&out).into_owned()
    }

    /// Valor numérico de un dígito hexadecimal ASCII
    fn hex_value(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    /// Parsea los headers HTTP
    ///
    /// Cada header tiene formato: "Name: Value"
    fn parse_headers(lines: &[&str]) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            // La línea vacía marca el fin de los headers
            if line.trim().is_empty() {
                break;
            }

            // Buscar el separador ':'
            if let Some(colon_pos) = line.find(':') {
                let name = line[..colon_pos].trim().to_string();
                let value = line[colon_pos + 1..].trim().to_string();
                headers.insert(name, value);
            } else {
                // Header sin ':' es inválido
                return Err(ParseError::InvalidHeader(line.to_string()));
            }
        }

        Ok(headers)
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> Method {
        self.method
    }

    /// Obtiene el path del request (ya decodificado)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene todos los query parameters
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Obtiene un query parameter específico
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::http::Request;
    ///
    /// let raw = b"GET /logo.png?v=42 HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.query_param("v"), Some("42"));
    /// assert_eq!(request.query_param("missing"), None);
    /// ```
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }

    /// Obtiene todos los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header específico
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }
}

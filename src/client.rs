//! Client
//!
//! Opens one connection per request, the way the server expects.

use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use crate::error::{KvError, Result};
use crate::protocol::{read_frame, write_frame, Request, Response};

/// Largest reply accepted from a server
const MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// Client for an mtkv server
#[derive(Debug, Clone)]
pub struct Client {
    addr: SocketAddr,
}

impl Client {
    /// Resolve the server address
    pub fn new<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let addr = addr
            .to_socket_addrs()
            .map_err(|e| KvError::network("getaddrinfo()", e))?
            .next()
            .ok_or_else(|| KvError::Config("server address resolved to nothing".to_string()))?;

        Ok(Self { addr })
    }

    /// Server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Send a raw operation message (`GET:key`, `PUT:key:value`) and wait for
    /// the reply
    pub fn send(&self, message: &[u8]) -> Result<Response> {
        let stream = TcpStream::connect(self.addr).map_err(|e| KvError::network("connect()", e))?;
        stream.set_nodelay(true)?;

        let mut writer = BufWriter::new(stream.try_clone()?);
        let mut reader = BufReader::new(stream);

        write_frame(&mut writer, message)?;

        match read_frame(&mut reader, MAX_RESPONSE_SIZE)? {
            Some(reply) => Response::parse(&reply),
            None => Err(KvError::Protocol(
                "server closed the connection without replying".to_string(),
            )),
        }
    }

    /// Send a typed request
    pub fn execute(&self, request: &Request) -> Result<Response> {
        self.send(&request.to_message())
    }

    /// Look up `key`
    pub fn get(&self, key: &str) -> Result<Response> {
        self.execute(&Request::Get {
            key: key.as_bytes().to_vec(),
        })
    }

    /// Store `value` under `key`
    pub fn put(&self, key: &str, value: &str) -> Result<Response> {
        self.execute(&Request::Put {
            key: key.as_bytes().to_vec(),
            value: value.as_bytes().to_vec(),
        })
    }
}

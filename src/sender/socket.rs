use super::SenderError;
use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

/// InfluxDB v1 sender writing raw line-protocol frames over TCP. One
/// connection per batch; the completed write is the only success
/// signal, so the reported status is always 0.
#[derive(Debug)]
pub struct InfluxDbTcpSender {
    host: String,
    port: u16,
    timeout: Duration,
}

impl InfluxDbTcpSender {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout,
        }
    }

    pub fn write_data(&self, batch: &[u8]) -> Result<u16, SenderError> {
        let addr = resolve(&self.host, self.port)?;
        let mut stream = TcpStream::connect_timeout(&addr, self.timeout)?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.write_all(batch)?;
        stream.flush()?;
        Ok(0)
    }
}

/// InfluxDB v1 sender writing one fire-and-forget datagram per batch.
/// Only local socket errors are observable.
#[derive(Debug)]
pub struct InfluxDbUdpSender {
    host: String,
    port: u16,
    timeout: Duration,
}

impl InfluxDbUdpSender {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout,
        }
    }

    pub fn write_data(&self, batch: &[u8]) -> Result<u16, SenderError> {
        let addr = resolve(&self.host, self.port)?;
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_write_timeout(Some(self.timeout))?;
        socket.send_to(batch, addr)?;
        Ok(0)
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, SenderError> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| SenderError::InvalidConfiguration(format!("Could not resolve host {host}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    #[test]
    fn tcp_sender_writes_one_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).unwrap();
            received
        });

        let sender = InfluxDbTcpSender::new("127.0.0.1", port, Duration::from_secs(1));
        let status = sender.write_data(b"metric count=1i 1700000000\n").unwrap();
        assert_eq!(status, 0);

        let received = server.join().unwrap();
        assert_eq!(received, b"metric count=1i 1700000000\n");
    }

    #[test]
    fn tcp_sender_surfaces_connection_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let sender = InfluxDbTcpSender::new("127.0.0.1", port, Duration::from_millis(250));
        let result = sender.write_data(b"metric count=1i\n");
        assert!(matches!(result, Err(SenderError::Io(_))));
    }

    #[test]
    fn udp_sender_sends_one_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(1)))
            .unwrap();
        let port = receiver.local_addr().unwrap().port();

        let sender = InfluxDbUdpSender::new("127.0.0.1", port, Duration::from_secs(1));
        let status = sender.write_data(b"metric count=2i 1700000000\n").unwrap();
        assert_eq!(status, 0);

        let mut buf = [0u8; 128];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"metric count=2i 1700000000\n");
    }

    #[test]
    fn unresolvable_host_is_an_error() {
        let sender = InfluxDbTcpSender::new("host.invalid.", 8086, Duration::from_millis(250));
        assert!(sender.write_data(b"x").is_err());
    }
}

use std::{io::Cursor, time::Duration};

use bytes::Bytes;
use dolphindb_error::{ClientError, CodecError, DolphinResult, GenericError, ResultExt, StackError, StatusCode};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::mpsc,
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, trace};

use super::{check_status, BehaviorOptions, ClientConfig, CommandKind, Request, Response, ResponseHeader};
use crate::{
    codec::{read_value, write_value, ChunkReader, ChunkWriter, CodecConfig},
    model::Value,
    types::WireOrder,
};

/// Размер одного чтения из сокета при потоковом декодировании.
const READ_CHUNK: usize = 64 * 1024;

/// Предел длины строки заголовка или статуса ответа.
const MAX_LINE: u64 = 64 * 1024;

/// Соединение с одним узлом сервера.
///
/// Один запрос за раз (`&mut self`). Обмен, прерванный таймаутом, ошибкой
/// ввода-вывода или отменой future, помечает соединение как сломанное;
/// после этого запросы отклоняются до переподключения.
pub struct DolphinConnection {
    /// Адрес узла `host:port`
    address: String,
    /// Читающая часть соединения с буферизацией
    reader: BufReader<OwnedReadHalf>,
    /// Пишущая часть соединения с буферизацией
    writer: BufWriter<OwnedWriteHalf>,
    /// Идентификатор сессии из ответа на рукопожатие
    session_id: String,
    read_timeout: Duration,
    write_timeout: Duration,
    codec: CodecConfig,
    chunk_bytes: usize,
    channel_capacity: usize,
    broken: bool,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl DolphinConnection {
    /// Открывает TCP соединение и выполняет рукопожатие.
    pub async fn connect(
        address: &str,
        config: &ClientConfig,
    ) -> DolphinResult<Self> {
        debug!("Connecting to {address}");

        let stream = timeout(config.connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| ClientError::ConnectionTimeout {
                address: address.to_string(),
            })?
            .map_err(|e| ClientError::ConnectionFailed {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        stream
            .set_nodelay(true)
            .map_err(ClientError::from)
            .with_context(|| format!("configuring socket to {address}"))?;

        let (read_half, write_half) = stream.into_split();
        let mut conn = Self {
            address: address.to_string(),
            reader: BufReader::with_capacity(READ_CHUNK, read_half),
            writer: BufWriter::new(write_half),
            session_id: String::new(),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            codec: config.codec.clone(),
            chunk_bytes: config.upload_chunk_bytes,
            channel_capacity: config.upload_channel_capacity.max(1),
            broken: false,
        };

        let response = conn
            .execute(&Request::connect(), &config.behavior)
            .await
            .with_context(|| format!("handshake with {address}"))?;
        conn.session_id = response.header.session_id;
        debug!("Handshake with {address} done, session {}", conn.session_id);
        Ok(conn)
    }

    /// Отправляет запрос и читает ответ.
    ///
    /// Ошибка сервера (`ServerError`) оставляет соединение рабочим.
    pub async fn execute(
        &mut self,
        request: &Request,
        options: &BehaviorOptions,
    ) -> DolphinResult<Response> {
        if self.broken {
            return Err(ClientError::ConnectionBroken.into());
        }
        if request.kind() != CommandKind::Variable {
            options.validate()?;
        }

        self.broken = true;
        let result = self.exchange(request, options).await;
        self.broken = match &result {
            Ok(_) => false,
            Err(err) => err.status_code() != StatusCode::ServerError,
        };
        result
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Закрывает соединение.
    pub async fn close(mut self) -> DolphinResult<()> {
        debug!("Closing connection to {}", self.address);
        self.writer.shutdown().await.map_err(ClientError::from)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Внутренние методы и функции
////////////////////////////////////////////////////////////////////////////////

impl DolphinConnection {
    async fn exchange(
        &mut self,
        request: &Request,
        options: &BehaviorOptions,
    ) -> DolphinResult<Response> {
        trace!(
            "Sending {} request ({} bytes, {} args) to {}",
            request.kind(),
            request.command().len(),
            request.args().len(),
            self.address
        );
        self.send(request, options).await?;
        self.receive().await
    }

    async fn send(
        &mut self,
        request: &Request,
        options: &BehaviorOptions,
    ) -> DolphinResult<()> {
        let header = request.header(&self.session_id, options);
        self.write(&header).await.context("writing request header")?;
        self.write(request.command()).await.context("writing request command")?;
        if !request.args().is_empty() {
            self.send_args(request).await.context("writing request arguments")?;
        }
        timeout(self.write_timeout, self.writer.flush())
            .await
            .map_err(|_| ClientError::WriteTimeout)?
            .map_err(ClientError::from)
            .with_context(|| format!("flushing request to {}", self.address))?;
        Ok(())
    }

    /// Кодирует аргументы в блокирующей задаче и пишет куски по мере
    /// готовности; в памяти одновременно не больше `capacity` кусков.
    async fn send_args(
        &mut self,
        request: &Request,
    ) -> DolphinResult<()> {
        let (tx, mut rx) = mpsc::channel::<Bytes>(self.channel_capacity);
        let args = request.args().clone();
        let order = request.order();
        let codec = self.codec.clone();
        let chunk_bytes = self.chunk_bytes;
        let encoder: JoinHandle<Result<u64, CodecError>> = tokio::task::spawn_blocking(move || {
            let mut w = ChunkWriter::new(chunk_bytes, |chunk| {
                tx.blocking_send(chunk).map_err(|_| {
                    std::io::Error::new(std::io::ErrorKind::BrokenPipe, "request writer stopped")
                })
            });
            for arg in args.iter() {
                write_value(&mut w, arg, order, &codec)?;
            }
            Ok(w.finish()?)
        });

        while let Some(chunk) = rx.recv().await {
            trace!("Writing {} argument bytes", chunk.len());
            self.write(&chunk).await?;
        }
        let written = encoder.await.map_err(join_error)??;
        trace!("Arguments written: {written} bytes");
        Ok(())
    }

    async fn write(
        &mut self,
        bytes: &[u8],
    ) -> DolphinResult<()> {
        timeout(self.write_timeout, self.writer.write_all(bytes))
            .await
            .map_err(|_| ClientError::WriteTimeout)?
            .map_err(ClientError::from)?;
        Ok(())
    }

    async fn receive(&mut self) -> DolphinResult<Response> {
        let line = self
            .read_line()
            .await
            .with_context(|| format!("reading response header from {}", self.address))?;
        let header = ResponseHeader::parse(&line)?;
        let status = self
            .read_line()
            .await
            .with_context(|| format!("reading response status from {}", self.address))?;
        check_status(&status)?;

        let value = match header.object_count {
            0 => None,
            1 => Some(self.read_object(header.order).await?),
            n => {
                return Err(ClientError::Protocol {
                    reason: format!("unexpected object count {n}"),
                }
                .into())
            }
        };
        trace!("Response from {}: {} objects", self.address, header.object_count);
        Ok(Response { header, value })
    }

    /// Строка ответа без `\n` (и `\r`, если он есть), не длиннее
    /// `MAX_LINE` байт вместе с переводом строки.
    async fn read_line(&mut self) -> DolphinResult<String> {
        let mut buf = Vec::new();
        let mut limited = (&mut self.reader).take(MAX_LINE);
        let n = timeout(self.read_timeout, limited.read_until(b'\n', &mut buf))
            .await
            .map_err(|_| ClientError::ReadTimeout)?
            .map_err(ClientError::from)?;
        if buf.last() != Some(&b'\n') {
            if n as u64 >= MAX_LINE {
                return Err(ClientError::Protocol {
                    reason: format!("response line longer than {MAX_LINE} bytes"),
                }
                .into());
            }
            return Err(ClientError::ConnectionClosed.into());
        }
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Читает объект ответа.
    ///
    /// Если объект целиком уже в буфере чтения, он декодируется сразу.
    /// Иначе байты из сокета передаются декодеру в блокирующей задаче
    /// через ограниченный канал.
    async fn read_object(
        &mut self,
        order: WireOrder,
    ) -> DolphinResult<Value> {
        let buffered = self.reader.buffer();
        if !buffered.is_empty() {
            let mut cursor = Cursor::new(buffered);
            match read_value(&mut cursor, order, &self.codec) {
                Ok(value) => {
                    let used = cursor.position() as usize;
                    self.reader.consume(used);
                    return Ok(value);
                }
                Err(err) if err.is_truncated() => {}
                Err(err) => return Err(err.into()),
            }
        }

        let (tx, rx) = mpsc::channel::<Bytes>(self.channel_capacity);
        let codec = self.codec.clone();
        let mut decoder: JoinHandle<Result<Value, CodecError>> =
            tokio::task::spawn_blocking(move || read_value(&mut ChunkReader::new(rx), order, &codec));

        let pending = Bytes::copy_from_slice(self.reader.buffer());
        self.reader.consume(pending.len());
        if !pending.is_empty() && tx.send(pending).await.is_err() {
            return finish_decode(decoder.await);
        }

        let mut tx = Some(tx);
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let Some(sender) = tx.as_ref() else {
                break;
            };
            tokio::select! {
                result = &mut decoder => {
                    return finish_decode(result);
                }
                read = timeout(self.read_timeout, self.reader.read(&mut buf)) => {
                    let n = read
                        .map_err(|_| ClientError::ReadTimeout)?
                        .map_err(ClientError::from)?;
                    if n == 0 {
                        tx = None;
                        continue;
                    }
                    if sender.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                        tx = None;
                    }
                }
            }
        }
        finish_decode(decoder.await)
    }
}

fn finish_decode(
    result: Result<Result<Value, CodecError>, tokio::task::JoinError>
) -> DolphinResult<Value> {
    match result.map_err(join_error)? {
        Ok(value) => Ok(value),
        Err(err) if err.is_truncated() => Err(ClientError::ConnectionClosed.into()),
        Err(err) => Err(err.into()),
    }
}

fn join_error(err: tokio::task::JoinError) -> StackError {
    GenericError::new(StatusCode::Internal, format!("codec task failed: {err}")).into()
}

use std::io::{self, BufRead, Read, Write};

use bytes::{Buf, Bytes, BytesMut};
use tokio::sync::mpsc;

/// Порог, после которого накопленные байты отдаются получателю.
pub const DEFAULT_CHUNK_BYTES: usize = 1 << 20;

/// Буферизующий `Write`, который отдаёт закодированные байты кусками.
///
/// Используется при потоковой выгрузке: кодек пишет значение, а куски по
/// мере накопления уходят в сокет, не дожидаясь конца кодирования.
pub struct ChunkWriter<F>
where
    F: FnMut(Bytes) -> io::Result<()>,
{
    buf: BytesMut,
    threshold: usize,
    sink: F,
    written: u64,
}

/// Блокирующий `BufRead` поверх канала кусков.
///
/// Обратная сторона [`ChunkWriter`]: асинхронная часть читает сокет и
/// отправляет куски в канал, а декодер в блокирующей задаче читает их как
/// обычный поток. Закрытие канала означает конец данных.
pub struct ChunkReader {
    rx: mpsc::Receiver<Bytes>,
    current: Bytes,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ChunkReader {
    pub fn new(rx: mpsc::Receiver<Bytes>) -> Self {
        Self {
            rx,
            current: Bytes::new(),
        }
    }
}

impl<F> ChunkWriter<F>
where
    F: FnMut(Bytes) -> io::Result<()>,
{
    pub fn new(
        threshold: usize,
        sink: F,
    ) -> Self {
        let threshold = threshold.max(1);
        Self {
            buf: BytesMut::with_capacity(threshold),
            threshold,
            sink,
            written: 0,
        }
    }

    /// Сколько байтов уже передано получателю.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Отдаёт остаток буфера и возвращает число переданных байтов.
    pub fn finish(mut self) -> io::Result<u64> {
        self.emit()?;
        Ok(self.written)
    }

    fn emit(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = self.buf.split().freeze();
        self.written += chunk.len() as u64;
        (self.sink)(chunk)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для ChunkWriter
////////////////////////////////////////////////////////////////////////////////

impl<F> Write for ChunkWriter<F>
where
    F: FnMut(Bytes) -> io::Result<()>,
{
    fn write(
        &mut self,
        data: &[u8],
    ) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        if self.buf.len() >= self.threshold {
            self.emit()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit()
    }
}

impl Read for ChunkReader {
    fn read(
        &mut self,
        out: &mut [u8],
    ) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for ChunkReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        while self.current.is_empty() {
            match self.rx.blocking_recv() {
                Some(chunk) => self.current = chunk,
                None => break,
            }
        }
        Ok(&self.current)
    }

    fn consume(
        &mut self,
        amt: usize,
    ) {
        self.current.advance(amt);
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::{encode, write_value, CodecConfig},
        model::{ColumnData, Value, Vector},
        types::{DataType, WireOrder},
    };

    /// Тест проверяет, что куски складываются в исходный поток байтов.
    #[test]
    fn test_chunks_concatenate() {
        let value: Value = Vector::new(DataType::Long, ColumnData::Long((0..10_000).collect()))
            .unwrap()
            .into();
        let mut chunks: Vec<Bytes> = Vec::new();
        let mut w = ChunkWriter::new(4096, |chunk| {
            chunks.push(chunk);
            Ok(())
        });
        let config = CodecConfig {
            chunk_size: 1000,
            ..CodecConfig::default()
        };
        write_value(&mut w, &value, WireOrder::Little, &config).unwrap();
        let total = w.finish().unwrap();

        assert!(chunks.len() > 1);
        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
        assert_eq!(total as usize, joined.len());
        assert_eq!(joined, encode(&value, WireOrder::Little).unwrap());
    }

    /// Тест проверяет, что flush на пустом буфере ничего не отдаёт.
    #[test]
    fn test_empty_flush() {
        let mut calls = 0;
        let mut w = ChunkWriter::new(16, |_| {
            calls += 1;
            Ok(())
        });
        w.flush().unwrap();
        w.write_all(b"abc").unwrap();
        w.flush().unwrap();
        w.flush().unwrap();
        assert_eq!(w.written(), 3);
        drop(w);
        assert_eq!(calls, 1);
    }

    /// Тест проверяет чтение значения из канала кусков, разрезанного в
    /// произвольных местах.
    #[test]
    fn test_reader_across_chunks() {
        let value: Value = Vector::new(
            DataType::String,
            ColumnData::Text((0..300).map(|i| format!("row{i}")).collect()),
        )
        .unwrap()
        .into();
        let bytes = encode(&value, WireOrder::Little).unwrap();

        let (tx, rx) = mpsc::channel(1024);
        for piece in bytes.chunks(7) {
            tx.try_send(Bytes::copy_from_slice(piece)).unwrap();
        }
        drop(tx);

        let mut reader = ChunkReader::new(rx);
        let decoded =
            crate::codec::read_value(&mut reader, WireOrder::Little, &CodecConfig::default())
                .unwrap();
        assert_eq!(decoded, value);
        assert!(reader.fill_buf().unwrap().is_empty());
    }

    /// Тест проверяет, что закрытый канал даёт обрыв данных.
    #[test]
    fn test_reader_closed_early() {
        let value: Value = Vector::new(DataType::Int, ColumnData::Int(vec![1, 2, 3]))
            .unwrap()
            .into();
        let bytes = encode(&value, WireOrder::Little).unwrap();
        let (tx, rx) = mpsc::channel(4);
        tx.try_send(Bytes::copy_from_slice(&bytes[..9])).unwrap();
        drop(tx);

        let err = crate::codec::read_value(
            &mut ChunkReader::new(rx),
            WireOrder::Little,
            &CodecConfig::default(),
        )
        .unwrap_err();
        assert!(err.is_truncated());
    }

    /// Тест проверяет, что ошибка получателя доходит до кодека.
    #[test]
    fn test_sink_error() {
        let mut w = ChunkWriter::new(2, |_| {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        });
        let err = w.write_all(b"abcd").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}

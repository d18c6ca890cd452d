//! I/O 抽象层.
//!
//! 为解封装器提供带缓冲的只读接口, 后端可以是本地文件或内存缓冲区.
//! 不提供任何网络协议后端.

use std::io::{self, Read, Seek};

use byteorder::{ByteOrder, LittleEndian};
use mediadec_core::{MediaError, MediaResult};

/// I/O 后端 trait
pub trait IoBackend: Send {
    /// 读取数据到缓冲区, 返回 0 表示末尾
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// 定位
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64>;
    /// 当前位置
    fn position(&mut self) -> io::Result<u64>;
    /// 总大小 (如果可知)
    fn size(&self) -> Option<u64>;
    /// 是否支持随机访问
    fn is_seekable(&self) -> bool;
}

/// 默认缓冲区大小 (32 KB)
const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// I/O 上下文
pub struct IoContext {
    inner: Box<dyn IoBackend>,
    buffer: Vec<u8>,
    /// 缓冲区中的有效数据长度
    buf_len: usize,
    /// 缓冲区当前读取位置
    buf_pos: usize,
}

impl IoContext {
    /// 从 I/O 后端创建上下文
    pub fn new(backend: Box<dyn IoBackend>) -> Self {
        Self {
            inner: backend,
            buffer: vec![0u8; DEFAULT_BUFFER_SIZE],
            buf_len: 0,
            buf_pos: 0,
        }
    }

    /// 从文件路径打开
    pub fn open_read(path: &str) -> MediaResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(Self::new(Box::new(FileBackend::new(file))))
    }

    /// 按 URL 打开
    ///
    /// 支持本地路径与 `file://` URL, 其余协议返回 `Unsupported`.
    pub fn open_url(url: &str) -> MediaResult<Self> {
        if let Some(path) = url.strip_prefix("file://") {
            return Self::open_read(path);
        }
        if let Some((scheme, _)) = url.split_once("://") {
            return Err(MediaError::Unsupported(format!("不支持的协议: {scheme}")));
        }
        Self::open_read(url)
    }

    /// 从内存数据创建
    pub fn from_memory(data: Vec<u8>) -> Self {
        Self::new(Box::new(MemoryBackend::from_data(data)))
    }

    // ========================
    // 读取方法
    // ========================

    /// 读取指定字节数, 数据不足时返回 `Eof`
    pub fn read_exact(&mut self, buf: &mut [u8]) -> MediaResult<()> {
        let mut total_read = 0;
        while total_read < buf.len() {
            let buffered = self.buf_len - self.buf_pos;
            if buffered > 0 {
                let to_copy = buffered.min(buf.len() - total_read);
                buf[total_read..total_read + to_copy]
                    .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + to_copy]);
                self.buf_pos += to_copy;
                total_read += to_copy;
            } else {
                self.buf_pos = 0;
                self.buf_len = self.inner.read(&mut self.buffer)?;
                if self.buf_len == 0 {
                    return Err(MediaError::Eof);
                }
            }
        }
        Ok(())
    }

    /// 尽量读取, 返回实际读到的字节数 (末尾之前不会短读)
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> MediaResult<usize> {
        let mut total_read = 0;
        while total_read < buf.len() {
            let buffered = self.buf_len - self.buf_pos;
            if buffered > 0 {
                let to_copy = buffered.min(buf.len() - total_read);
                buf[total_read..total_read + to_copy]
                    .copy_from_slice(&self.buffer[self.buf_pos..self.buf_pos + to_copy]);
                self.buf_pos += to_copy;
                total_read += to_copy;
            } else {
                self.buf_pos = 0;
                self.buf_len = self.inner.read(&mut self.buffer)?;
                if self.buf_len == 0 {
                    break;
                }
            }
        }
        Ok(total_read)
    }

    pub fn read_u8(&mut self) -> MediaResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16_le(&mut self) -> MediaResult<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    pub fn read_u32_le(&mut self) -> MediaResult<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    /// 读取 4 字节标签 (FourCC)
    pub fn read_tag(&mut self) -> MediaResult<[u8; 4]> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// 读取指定数量的字节
    ///
    /// 缓冲区分配失败时返回 `OutOfMemory`.
    pub fn read_bytes(&mut self, count: usize) -> MediaResult<Vec<u8>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(count).map_err(|e| {
            MediaError::OutOfMemory(format!("无法分配 {count} 字节读取缓冲区: {e}"))
        })?;
        buf.resize(count, 0);
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// 读取一行 (不含 `\n`), 超过 `max_len` 字节视为无效数据
    pub fn read_line(&mut self, max_len: usize) -> MediaResult<Vec<u8>> {
        let mut line = Vec::new();
        loop {
            let b = self.read_u8()?;
            if b == b'\n' {
                return Ok(line);
            }
            if line.len() >= max_len {
                return Err(MediaError::InvalidData(format!("行长度超过 {max_len} 字节")));
            }
            line.push(b);
        }
    }

    /// 跳过指定字节数
    pub fn skip(&mut self, count: usize) -> MediaResult<()> {
        let buffered = self.buf_len - self.buf_pos;
        if count <= buffered {
            self.buf_pos += count;
            return Ok(());
        }
        let remaining = count - buffered;
        self.buf_pos = self.buf_len;

        if self.inner.is_seekable() {
            self.inner.seek(io::SeekFrom::Current(remaining as i64))?;
        } else {
            let mut left = remaining;
            while left > 0 {
                let to_read = left.min(self.buffer.len());
                self.buf_len = self.inner.read(&mut self.buffer[..to_read])?;
                if self.buf_len == 0 {
                    return Err(MediaError::Eof);
                }
                left -= self.buf_len;
            }
            self.buf_pos = 0;
            self.buf_len = 0;
        }
        Ok(())
    }

    // ========================
    // 定位方法
    // ========================

    /// 定位, 会清空读缓冲区
    pub fn seek(&mut self, pos: io::SeekFrom) -> MediaResult<u64> {
        self.buf_pos = 0;
        self.buf_len = 0;
        Ok(self.inner.seek(pos)?)
    }

    /// 当前逻辑位置 (扣除缓冲区中尚未消耗的数据)
    pub fn position(&mut self) -> MediaResult<u64> {
        let raw_pos = self.inner.position()?;
        let buffered = (self.buf_len - self.buf_pos) as u64;
        Ok(raw_pos - buffered)
    }

    /// 是否支持随机访问
    pub fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }

    /// 总大小
    pub fn size(&self) -> Option<u64> {
        self.inner.size()
    }
}

/// 文件 I/O 后端
struct FileBackend {
    file: std::fs::File,
    size: Option<u64>,
}

impl FileBackend {
    fn new(file: std::fs::File) -> Self {
        let size = file.metadata().ok().map(|m| m.len());
        Self { file, size }
    }
}

impl IoBackend for FileBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    fn size(&self) -> Option<u64> {
        self.size
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

/// 内存缓冲区 I/O 后端
pub struct MemoryBackend {
    data: Vec<u8>,
    pos: usize,
}

impl MemoryBackend {
    /// 从已有数据创建
    pub fn from_data(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl IoBackend for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.data.len().saturating_sub(self.pos);
        let to_read = buf.len().min(available);
        buf[..to_read].copy_from_slice(&self.data[self.pos..self.pos + to_read]);
        self.pos += to_read;
        Ok(to_read)
    }

    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            io::SeekFrom::Start(offset) => offset as i64,
            io::SeekFrom::End(offset) => self.data.len() as i64 + offset,
            io::SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek 位置不能为负",
            ));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.pos as u64)
    }

    fn size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn is_seekable(&self) -> bool {
        true
    }
}

//! Binary encoding of stack items for contract storage.
//!
//! Layout: one [`StackItemType`] tag byte followed by the payload.
//! Boolean is one byte, Integer and ByteArray are var-bytes, Array and Struct
//! are a var-int count followed by the elements, Map is a var-int count
//! followed by key/value pairs. Container nesting is bounded by
//! `max_struct_depth`, so stored data that contains itself fails instead of
//! looping.

use crate::error::{VmError, VmResult};
use crate::limits::VmLimits;
use crate::stack_item::{Array, Map, MapKey, StackItem, StackItemType, Struct};
use indexmap::IndexMap;
use num_bigint::BigInt;

/// Binary serializer helpers for VM stack items.
pub struct BinarySerializer;

impl BinarySerializer {
    const MAX_INTEGER_SIZE: usize = 32;

    /// Serializes a stack item.
    pub fn serialize(item: &StackItem, limits: &VmLimits) -> VmResult<Vec<u8>> {
        let mut writer = Vec::new();
        let mut remaining = limits.max_items;
        Self::write_item(item, &mut writer, 0, limits, &mut remaining)?;
        Ok(writer)
    }

    /// Deserializes a stack item. The whole input must be consumed.
    pub fn deserialize(data: &[u8], limits: &VmLimits) -> VmResult<StackItem> {
        let mut reader = Reader::new(data);
        let mut remaining = limits.max_items;
        let item = Self::read_item(&mut reader, 0, limits, &mut remaining)?;
        if !reader.is_empty() {
            return Err(VmError::format(format!(
                "{} trailing bytes after stack item",
                reader.remaining()
            )));
        }
        Ok(item)
    }

    fn write_item(
        item: &StackItem,
        writer: &mut Vec<u8>,
        depth: usize,
        limits: &VmLimits,
        remaining: &mut usize,
    ) -> VmResult<()> {
        Self::take_item(remaining, limits)?;

        match item {
            StackItem::Boolean(value) => {
                writer.push(StackItemType::Boolean.to_byte());
                writer.push(u8::from(*value));
            }
            StackItem::Integer(_) => {
                let bytes = item.get_byte_array()?;
                if bytes.len() > Self::MAX_INTEGER_SIZE {
                    return Err(VmError::format("integer too large"));
                }
                writer.push(StackItemType::Integer.to_byte());
                write_var_bytes(writer, &bytes);
            }
            StackItem::ByteArray(bytes) => {
                if bytes.len() > limits.max_item_size {
                    return Err(VmError::format("byte array too large"));
                }
                writer.push(StackItemType::ByteArray.to_byte());
                write_var_bytes(writer, bytes);
            }
            StackItem::Array(array) => {
                Self::enter_container(depth, limits)?;
                writer.push(StackItemType::Array.to_byte());
                Self::write_sequence(&array.items(), writer, depth, limits, remaining)?;
            }
            StackItem::Struct(structure) => {
                Self::enter_container(depth, limits)?;
                writer.push(StackItemType::Struct.to_byte());
                Self::write_sequence(&structure.items(), writer, depth, limits, remaining)?;
            }
            StackItem::Map(map) => {
                Self::enter_container(depth, limits)?;
                writer.push(StackItemType::Map.to_byte());
                let entries = map.entries();
                write_var_int(writer, entries.len() as u64);
                for (key, value) in entries {
                    let key = StackItem::from(key);
                    Self::write_item(&key, writer, depth + 1, limits, remaining)?;
                    Self::write_item(&value, writer, depth + 1, limits, remaining)?;
                }
            }
            StackItem::InteropInterface(_) => {
                return Err(VmError::Unsupported(StackItemType::InteropInterface));
            }
        }

        Ok(())
    }

    fn write_sequence(
        items: &[StackItem],
        writer: &mut Vec<u8>,
        depth: usize,
        limits: &VmLimits,
        remaining: &mut usize,
    ) -> VmResult<()> {
        write_var_int(writer, items.len() as u64);
        for child in items {
            Self::write_item(child, writer, depth + 1, limits, remaining)?;
        }
        Ok(())
    }

    fn read_item(
        reader: &mut Reader<'_>,
        depth: usize,
        limits: &VmLimits,
        remaining: &mut usize,
    ) -> VmResult<StackItem> {
        Self::take_item(remaining, limits)?;

        let tag = reader.read_byte()?;
        let item_type = StackItemType::from_byte(tag)
            .ok_or_else(|| VmError::format(format!("unknown stack item type 0x{tag:02x}")))?;

        match item_type {
            StackItemType::Boolean => match reader.read_byte()? {
                0 => Ok(StackItem::Boolean(false)),
                1 => Ok(StackItem::Boolean(true)),
                other => Err(VmError::format(format!("invalid boolean byte 0x{other:02x}"))),
            },
            StackItemType::Integer => {
                let bytes = reader.read_var_bytes(Self::MAX_INTEGER_SIZE)?;
                if bytes.is_empty() {
                    Ok(StackItem::Integer(BigInt::from(0)))
                } else {
                    Ok(StackItem::Integer(BigInt::from_signed_bytes_le(bytes)))
                }
            }
            StackItemType::ByteArray => {
                let bytes = reader.read_var_bytes(limits.max_item_size)?;
                Ok(StackItem::ByteArray(bytes.to_vec()))
            }
            StackItemType::Array | StackItemType::Struct => {
                Self::enter_container(depth, limits)?;
                let count = Self::read_count(reader, limits, *remaining)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(Self::read_item(reader, depth + 1, limits, remaining)?);
                }
                if item_type == StackItemType::Array {
                    Ok(StackItem::Array(Array::new(items)))
                } else {
                    Ok(StackItem::Struct(Struct::new(items)))
                }
            }
            StackItemType::Map => {
                Self::enter_container(depth, limits)?;
                let count = Self::read_count(reader, limits, *remaining / 2)?;
                let mut entries = IndexMap::with_capacity(count);
                for _ in 0..count {
                    let key = Self::read_item(reader, depth + 1, limits, remaining)?;
                    let key = MapKey::try_from(key)?;
                    let value = Self::read_item(reader, depth + 1, limits, remaining)?;
                    if entries.insert(key, value).is_some() {
                        return Err(VmError::format("duplicate map key"));
                    }
                }
                Ok(StackItem::Map(Map::new(entries)))
            }
            StackItemType::InteropInterface => Err(VmError::Unsupported(item_type)),
        }
    }

    fn read_count(reader: &mut Reader<'_>, limits: &VmLimits, budget: usize) -> VmResult<usize> {
        let count = reader.read_var_int(limits.max_items as u64)? as usize;
        if count > budget {
            return Err(VmError::ItemLimitExceeded {
                limit: limits.max_items,
            });
        }
        Ok(count)
    }

    fn take_item(remaining: &mut usize, limits: &VmLimits) -> VmResult<()> {
        *remaining = remaining.checked_sub(1).ok_or(VmError::ItemLimitExceeded {
            limit: limits.max_items,
        })?;
        Ok(())
    }

    fn enter_container(depth: usize, limits: &VmLimits) -> VmResult<()> {
        if depth >= limits.max_struct_depth {
            log::debug!("serialization aborted at depth {depth}");
            return Err(VmError::DepthExceeded {
                limit: limits.max_struct_depth,
            });
        }
        Ok(())
    }
}

fn write_var_int(writer: &mut Vec<u8>, value: u64) {
    if value < 0xFD {
        writer.push(value as u8);
    } else if value <= 0xFFFF {
        writer.push(0xFD);
        writer.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xFFFF_FFFF {
        writer.push(0xFE);
        writer.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        writer.push(0xFF);
        writer.extend_from_slice(&value.to_le_bytes());
    }
}

fn write_var_bytes(writer: &mut Vec<u8>, bytes: &[u8]) {
    write_var_int(writer, bytes.len() as u64);
    writer.extend_from_slice(bytes);
}

struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn read_bytes(&mut self, count: usize) -> VmResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(VmError::format("unexpected end of data"));
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    fn read_byte(&mut self) -> VmResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_var_int(&mut self, max: u64) -> VmResult<u64> {
        let prefix = self.read_byte()?;
        let (value, min) = match prefix {
            0xFD => {
                let mut buf = [0u8; 2];
                buf.copy_from_slice(self.read_bytes(2)?);
                (u64::from(u16::from_le_bytes(buf)), 0xFD)
            }
            0xFE => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(self.read_bytes(4)?);
                (u64::from(u32::from_le_bytes(buf)), 0x1_0000)
            }
            0xFF => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(self.read_bytes(8)?);
                (u64::from_le_bytes(buf), 0x1_0000_0000)
            }
            small => (u64::from(small), 0),
        };

        if value < min {
            return Err(VmError::format("non-canonical var int"));
        }
        if value > max {
            return Err(VmError::format(format!("var int {value} exceeds {max}")));
        }
        Ok(value)
    }

    fn read_var_bytes(&mut self, max: usize) -> VmResult<&'a [u8]> {
        let len = self.read_var_int(max as u64)? as usize;
        self.read_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_int_encoding() {
        let mut writer = Vec::new();
        write_var_int(&mut writer, 0xFC);
        write_var_int(&mut writer, 0xFD);
        write_var_int(&mut writer, 0x1_0000);
        assert_eq!(
            writer,
            vec![0xFC, 0xFD, 0xFD, 0x00, 0xFE, 0x00, 0x00, 0x01, 0x00]
        );

        let mut reader = Reader::new(&writer);
        assert_eq!(reader.read_var_int(u64::MAX).unwrap(), 0xFC);
        assert_eq!(reader.read_var_int(u64::MAX).unwrap(), 0xFD);
        assert_eq!(reader.read_var_int(u64::MAX).unwrap(), 0x1_0000);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_var_int_rejects_non_canonical() {
        let mut reader = Reader::new(&[0xFD, 0x10, 0x00]);
        assert_eq!(
            reader.read_var_int(u64::MAX),
            Err(VmError::format("non-canonical var int"))
        );
    }

    #[test]
    fn test_reader_end_of_data() {
        let mut reader = Reader::new(&[0x05, 0x01]);
        assert!(reader.read_var_bytes(16).is_err());
    }
}

//! Per-node encoding/decoding.
//!
//! A node record has no field tags. Its shape is the flattened layout of its
//! kind: `[kind u16][id u32]`, then attributes, then edges, both in layout
//! order.

use crate::codec::primitives::{Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{FIRST_NODE_ID, MAX_MULTI_EDGE_LEN};
use crate::model::{AttrValue, EdgeSlot, Key, Node, NodeKind, StringTable};

// =============================================================================
// DECODING
// =============================================================================

/// Decodes one node record. `bound` is the graph's next free id; string keys
/// must already be in `strings`.
pub fn decode_node(
    reader: &mut Reader<'_>,
    bound: u32,
    strings: &StringTable,
) -> Result<Node, DecodeError> {
    let tag = reader.read_u16("node_kind")?;
    let kind = NodeKind::from_u16(tag).ok_or(DecodeError::UnknownNodeKind { tag })?;
    if kind.is_abstract() {
        return Err(DecodeError::AbstractNodeKind { kind });
    }

    let id = reader.read_node_id("node_id")?;
    if id.0 < FIRST_NODE_ID {
        return Err(DecodeError::ReservedNodeId { id });
    }
    if id.0 >= bound {
        return Err(DecodeError::NodeIdOutOfRange { id, bound });
    }

    let mut node = Node::new(id, kind);
    for value in node.attributes.iter_mut() {
        *value = match *value {
            AttrValue::Bool(_) => AttrValue::Bool(reader.read_bool("attribute")?),
            AttrValue::UByte(_) => AttrValue::UByte(reader.read_byte("attribute")?),
            AttrValue::UInt(_) => AttrValue::UInt(reader.read_u32("attribute")?),
            AttrValue::Str(_) => {
                let key = Key(reader.read_u32("string_key")?);
                if !strings.contains_key(key) {
                    return Err(DecodeError::UnknownStringKey { key });
                }
                AttrValue::Str(key)
            }
        };
    }
    for slot in node.edges.iter_mut() {
        *slot = if matches!(slot, EdgeSlot::Multi(_)) {
            EdgeSlot::Multi(reader.read_id_run(MAX_MULTI_EDGE_LEN, "edge")?)
        } else {
            EdgeSlot::Single(reader.read_node_id("edge")?)
        };
    }
    Ok(node)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes one node record and marks every string it references for saving.
pub fn encode_node(
    writer: &mut Writer,
    node: &Node,
    strings: &mut StringTable,
) -> Result<(), EncodeError> {
    writer.write_u16(node.kind() as u16);
    writer.write_node_id(node.id());

    for value in node.attributes() {
        match *value {
            AttrValue::Bool(b) => writer.write_bool(b),
            AttrValue::UByte(b) => writer.write_byte(b),
            AttrValue::UInt(n) => writer.write_u32(n),
            AttrValue::Str(key) => {
                strings
                    .mark_for_save(key)
                    .map_err(|_| EncodeError::UnknownStringKey { key })?;
                writer.write_u32(key.0);
            }
        }
    }
    for (_, slot) in node.edges() {
        match slot {
            EdgeSlot::Single(id) => writer.write_node_id(*id),
            EdgeSlot::Multi(ids) => {
                if ids.len() > MAX_MULTI_EDGE_LEN {
                    return Err(EncodeError::LengthExceedsLimit {
                        field: "edge",
                        len: ids.len(),
                        max: MAX_MULTI_EDGE_LEN,
                    });
                }
                writer.write_id_run(ids);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeKind, Factory, NodeId};

    #[test]
    fn test_record_layout() {
        let mut f = Factory::new();
        let s = f.allocate(NodeKind::InterpolatedStringExpressionSyntax).unwrap();
        let c1 = f.allocate(NodeKind::InterpolatedStringTextSyntax).unwrap();
        let c2 = f.allocate(NodeKind::InterpolationSyntax).unwrap();
        let c3 = f.allocate(NodeKind::InterpolatedStringTextSyntax).unwrap();
        let e = EdgeKind::InterpolatedStringExpressionSyntaxContents;
        for c in [c1, c2, c3] {
            f.add_edge(s, e, c).unwrap();
        }
        f.set_attribute(s, "line", AttrValue::UInt(9)).unwrap();

        let mut strings = f.strings().clone();
        let mut writer = Writer::new();
        encode_node(&mut writer, f.node(s).unwrap(), &mut strings).unwrap();

        let mut expected = Writer::new();
        expected.write_u16(NodeKind::InterpolatedStringExpressionSyntax as u16);
        expected.write_u32(s.0);
        // path, line, column, end_line, end_column
        for v in [0, 9, 0, 0, 0] {
            expected.write_u32(v);
        }
        for id in [c1, c2, c3, NodeId::NONE] {
            expected.write_u32(id.0);
        }
        assert_eq!(writer.as_bytes(), expected.as_bytes());

        let mut reader = Reader::new(writer.as_bytes());
        let node = decode_node(&mut reader, f.next_id().0, &strings).unwrap();
        assert!(reader.is_empty());
        assert_eq!(&node, f.node(s).unwrap());
    }

    #[test]
    fn test_encode_marks_strings() {
        let mut f = Factory::new();
        let p = f.allocate(NodeKind::ParameterSyntax).unwrap();
        f.set_string(p, "identifier", "args").unwrap();
        let unused = f.intern("unused");

        let mut strings = f.strings().clone();
        let mut writer = Writer::new();
        encode_node(&mut writer, f.node(p).unwrap(), &mut strings).unwrap();
        let key = strings.find("args").unwrap();
        assert!(strings.is_marked(key));
        assert!(!strings.is_marked(unused));
    }

    #[test]
    fn test_decode_rejects_bad_header() {
        let strings = StringTable::new();

        let mut w = Writer::new();
        w.write_u16(NodeKind::COUNT as u16);
        w.write_u32(2);
        let err = decode_node(&mut Reader::new(w.as_bytes()), 10, &strings).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownNodeKind { .. }));

        let mut w = Writer::new();
        w.write_u16(NodeKind::StatementSyntax as u16);
        w.write_u32(2);
        let err = decode_node(&mut Reader::new(w.as_bytes()), 10, &strings).unwrap_err();
        assert!(matches!(err, DecodeError::AbstractNodeKind { .. }));

        let mut w = Writer::new();
        w.write_u16(NodeKind::BlockSyntax as u16);
        w.write_u32(1);
        let err = decode_node(&mut Reader::new(w.as_bytes()), 10, &strings).unwrap_err();
        assert_eq!(err, DecodeError::ReservedNodeId { id: NodeId(1) });

        let mut w = Writer::new();
        w.write_u16(NodeKind::BlockSyntax as u16);
        w.write_u32(10);
        let err = decode_node(&mut Reader::new(w.as_bytes()), 10, &strings).unwrap_err();
        assert!(matches!(err, DecodeError::NodeIdOutOfRange { .. }));
    }

    #[test]
    fn test_decode_unknown_string_key() {
        let strings = StringTable::new();
        let mut w = Writer::new();
        w.write_u16(NodeKind::IdentifierNameSyntax as u16);
        w.write_u32(2);
        w.write_u32(0); // path
        for _ in 0..4 {
            w.write_u32(0);
        }
        w.write_u32(5); // identifier
        let err = decode_node(&mut Reader::new(w.as_bytes()), 10, &strings).unwrap_err();
        assert_eq!(err, DecodeError::UnknownStringKey { key: Key(5) });
    }

    #[test]
    fn test_decode_truncated_edge_run() {
        let strings = StringTable::new();
        let mut w = Writer::new();
        w.write_u16(NodeKind::BlockSyntax as u16);
        w.write_u32(2);
        for _ in 0..5 {
            w.write_u32(0);
        }
        w.write_u32(3);
        let err = decode_node(&mut Reader::new(w.as_bytes()), 10, &strings).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { context: "edge" }));
    }
}

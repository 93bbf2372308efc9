use braid_format::{Parser, Reader};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::vertex::{BlobVertex, UnsignedConstant, Vertex, VertexId, VertexSequence};
use crate::writer::{SaveContext, Writer};

struct RefNode {
    marker: u8,
    target: VertexId,
}

impl Vertex for RefNode {
    fn save(&self, cx: &mut SaveContext<'_>) {
        cx.write_u8(self.marker);
        cx.write_relative_target(self.target);
    }
}

struct Labeled {
    name: String,
}

impl Vertex for Labeled {
    fn save(&self, cx: &mut SaveContext<'_>) {
        cx.write_string(&self.name);
    }
}

struct Scalars;

impl Vertex for Scalars {
    fn save(&self, cx: &mut SaveContext<'_>) {
        cx.write_u8(0x11);
        cx.write_u16(0x2233);
        cx.write_u32(0x4455_6677);
        cx.write_u64(0x8899_AABB_CCDD_EEFF);
        cx.write_f32(1.5);
        cx.write_f64(-2.25);
        cx.write_signed(-1234);
        cx.write_unsigned_long(1 << 40);
        cx.write_signed_long(-(1i64 << 40));
    }
}

#[test]
fn random_graphs_converge_with_exact_deltas() {
    for seed in 0..4u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut writer = Writer::new();
        let section = writer.new_section();

        let mut payloads = Vec::new();
        for i in 0..40u32 {
            payloads.push(writer.add(UnsignedConstant::new(i * 7919)));
        }
        let mut nodes = Vec::new();
        for i in 0..40usize {
            let target = payloads[rng.gen_range(0..payloads.len())];
            let node = writer.add(RefNode {
                marker: i as u8,
                target,
            });
            nodes.push((node, target));
        }

        let mut to_place: Vec<VertexId> = payloads.clone();
        to_place.extend(nodes.iter().map(|(node, _)| *node));
        // Random-width fillers stretch reference distances across
        // encoding-width boundaries.
        for _ in 0..20 {
            let len = rng.gen_range(0..40);
            let bytes = (0..len).map(|_| rng.gen_range(0..=u8::MAX)).collect();
            to_place.push(writer.add(BlobVertex::new(bytes)));
        }
        to_place.shuffle(&mut rng);
        for &id in &to_place {
            writer.place(section, id);
        }

        let blob = writer.save();
        let reader = Reader::new(blob.bytes()).unwrap();
        for (i, (node, target)) in nodes.iter().enumerate() {
            let mut parser = Parser::new(reader, blob.offset_of(*node).unwrap());
            assert_eq!(parser.get_u8(), Ok(i as u8), "seed {seed} node {i}");
            assert_eq!(
                parser.get_relative_offset(),
                Ok(blob.offset_of(*target).unwrap()),
                "seed {seed} node {i}"
            );
        }
        for (i, payload) in payloads.iter().enumerate() {
            let mut parser = Parser::new(reader, blob.offset_of(*payload).unwrap());
            assert_eq!(parser.get_unsigned(), Ok(i as u32 * 7919));
        }
    }
}

#[test]
fn strings_materialize_in_the_final_blob() {
    let mut writer = Writer::new();
    let section = writer.new_section();
    let hello = writer.add(Labeled {
        name: "hello".into(),
    });
    let empty = writer.add(Labeled { name: "".into() });
    let accented = writer.add(Labeled {
        name: "héllo".into(),
    });
    writer.place(section, hello);
    writer.place(section, empty);
    writer.place(section, accented);
    let blob = writer.save();

    let reader = Reader::new(blob.bytes()).unwrap();
    let mut parser = Parser::new(reader, blob.offset_of(hello).unwrap());
    assert_eq!(parser.get_string(), Ok("hello"));
    let mut parser = Parser::new(reader, blob.offset_of(empty).unwrap());
    assert_eq!(parser.get_string(), Ok(""));
    let mut parser = Parser::new(reader, blob.offset_of(accented).unwrap());
    assert_eq!(parser.get_string(), Ok("héllo"));
}

#[test]
fn blob_vertex_bytes_materialize() {
    let mut writer = Writer::new();
    let section = writer.new_section();
    let blob_vertex = writer.add(BlobVertex::new(vec![1, 2, 3]));
    writer.place(section, blob_vertex);
    let blob = writer.save();

    let reader = Reader::new(blob.bytes()).unwrap();
    let mut parser = Parser::new(reader, blob.offset_of(blob_vertex).unwrap());
    assert_eq!(parser.get_unsigned(), Ok(3));
    assert_eq!(reader.bytes_at(parser.offset(), 3), Ok(&[1u8, 2, 3][..]));
}

#[test]
fn scalar_writes_read_back() {
    let mut writer = Writer::new();
    let section = writer.new_section();
    let id = writer.add(Scalars);
    writer.place(section, id);
    let blob = writer.save();

    let reader = Reader::new(blob.bytes()).unwrap();
    let mut parser = Parser::new(reader, 0);
    assert_eq!(parser.get_u8(), Ok(0x11));
    assert_eq!(parser.get_u16(), Ok(0x2233));
    assert_eq!(parser.get_u32(), Ok(0x4455_6677));
    assert_eq!(parser.get_u64(), Ok(0x8899_AABB_CCDD_EEFF));
    assert_eq!(parser.get_f32(), Ok(1.5));
    assert_eq!(parser.get_f64(), Ok(-2.25));
    assert_eq!(parser.get_signed(), Ok(-1234));
    assert_eq!(parser.get_unsigned_long(), Ok(1 << 40));
    assert_eq!(parser.get_signed_long(), Ok(-(1i64 << 40)));
    assert_eq!(parser.offset(), reader.len());
}

#[test]
fn sequences_emit_children_inline() {
    let mut writer = Writer::new();
    let section = writer.new_section();
    let a = writer.unify(UnsignedConstant::new(42));
    let b = writer.unify(UnsignedConstant::new(43));
    let mut sequence = VertexSequence::new();
    sequence.push(a);
    sequence.push(b);
    let sequence = writer.unify(sequence);
    writer.place(section, sequence);
    let blob = writer.save();

    // Count 2, then the children's own encodings back to back.
    assert_eq!(blob.bytes(), [4, 84, 86]);
    // Inline children are part of their parent, not independently placed.
    assert_eq!(blob.offset_of(a), None);
    assert_eq!(blob.offset_of(b), None);
}

#[test]
fn equal_sequences_unify() {
    let mut writer = Writer::new();
    let a = writer.unify(UnsignedConstant::new(1));
    let b = writer.unify(UnsignedConstant::new(2));

    let mut first = VertexSequence::new();
    first.push(a);
    first.push(b);
    let mut second = VertexSequence::new();
    second.push(a);
    second.push(b);
    let mut reversed = VertexSequence::new();
    reversed.push(b);
    reversed.push(a);

    let first = writer.unify(first);
    assert_eq!(writer.unify(second), first);
    assert_ne!(writer.unify(reversed), first);
}

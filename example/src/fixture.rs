use bytes::{BufMut, Bytes, BytesMut};
use rowbin::BufMutExt;

pub const COLUMNS: [(&str, &str); 6] = [
    ("id", "UInt64"),
    ("name", "String"),
    ("level", "Enum8('low' = 1, 'high' = 2)"),
    ("tags", "Array(LowCardinality(String))"),
    ("joined", "DateTime64(3, 'UTC')"),
    ("payload", "Nullable(String)"),
];

/// `RowBinaryWithNamesAndTypes` payload of `COLUMNS` with `rows` rows.
pub fn payload(rows: u64) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_var_uint(COLUMNS.len() as u64);
    for (name, _) in COLUMNS {
        buf.put_var_string(name);
    }
    for (_, ty) in COLUMNS {
        buf.put_var_string(ty);
    }

    for id in 0..rows {
        buf.put_u64_le(id);
        buf.put_var_string(&format!("user-{id}"));
        buf.put_u8(if id % 2 == 0 { 1 } else { 2 });
        buf.put_var_uint(id % 3);
        for tag in 0..id % 3 {
            buf.put_var_string(&format!("tag-{tag}"));
        }
        buf.put_i64_le(1_700_000_000_000 + id as i64);
        match id % 2 {
            0 => buf.put_u8(1),
            _ => {
                buf.put_u8(0);
                buf.put_var_string(&format!("{{\"id\":{id}}}"));
            }
        }
    }

    buf.freeze()
}

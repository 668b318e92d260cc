#![no_main]

use ilscope::prelude::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut tables = MetadataTables::new();
    tables.add_type_def("Fuzz", "Target").unwrap();
    tables.add_method_def("Run").unwrap();
    tables.add_field("state").unwrap();
    tables.add_member_ref("Call").unwrap();
    tables.add_user_string("fuzz").unwrap();
    tables.add_standalone_sig(&[0x00, 0x00, 0x01]).unwrap();

    let mut last = 0;
    for instruction in decode_all(data, Some(&tables)) {
        match instruction {
            Ok(instruction) => {
                assert!(instruction.address as usize >= last);
                last = instruction.next_address() as usize;
                assert!(last <= data.len());
                let _ = render(&instruction, Some(&tables));
            }
            Err(_) => break,
        }
    }

    if let Ok(body) = MethodBody::from(data) {
        if let Ok(code) = body.code(data) {
            let _ = disassemble(code, None);
        }
    }
});

#![no_std]
#![no_main]
#![feature(alloc_error_handler)]
#![feature(const_mut_refs)]

use core::panic::PanicInfo;

use talc::*;

static mut ARENA: [u8; 10000] = [0; 10000];

#[global_allocator]
static ALLOCATOR: Talck<spin::Mutex<()>, ClaimOnOom> =
    Talc::new(unsafe { ClaimOnOom::new(Span::from_const_array(core::ptr::addr_of!(ARENA))) })
        .lock();

#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    loop {}
}

#[alloc_error_handler]
fn alloc_error_handler(layout: core::alloc::Layout) -> ! {
    panic!("Can't handle allocation: layout = {:?}", layout);
}

#[no_mangle]
pub extern "C" fn _start() -> ! {
    use entropy_coder::{
        stream::{DefaultEntropyReader, DefaultEntropyWriter},
        Interval,
    };

    let low = Interval::new(0, (1 << 62) - 1).unwrap();
    let high = Interval::new(1 << 62, (3 << 62) - 1).unwrap();

    let mut writer = DefaultEntropyWriter::new();
    writer.write_interval(&low).unwrap();
    writer.write_interval(&high).unwrap();
    let compressed = core::hint::black_box(writer.finalize().unwrap().into_inner());

    let mut reader = DefaultEntropyReader::from_compressed(compressed);
    assert!(low.includes(reader.value()));
    reader.next_interval(&low).unwrap();
    assert!(high.includes(reader.value()));
    reader.next_interval(&high).unwrap();
    assert!(reader.eof());

    loop {}
}

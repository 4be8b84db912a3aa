use devtree_abi::decode::{DevTree, DevTreeError};
use devtree_abi::layout::entry;
use devtree_abi::{DeviceType, ENTRY_SIZE, EntryFlags, HEADER_SIZE, IrqFlags};
use devtree_compiler::{
    CompileError, CompilerConfig, DeviceDescriptor, ValidationError, compile, compile_to_file,
    decompile,
};

fn uart0() -> DeviceDescriptor {
    DeviceDescriptor::new(DeviceType::Uart, "uart0")
        .with_mmio(0x1000_0000, 0x1000)
        .with_irq(33, IrqFlags::EDGE_TRIGGER, 1)
}

fn board() -> Vec<DeviceDescriptor> {
    vec![
        DeviceDescriptor::new(DeviceType::Ram, "ram").with_region(0x4000_0000, 0x8000_0000),
        uart0().with_aux([24_000_000, 115_200, 0, 0]),
        DeviceDescriptor::new(DeviceType::Framebuffer, "fb")
            .with_mmio(0x2000_0000, 0x30_0000)
            .with_aux([1024, 768, 4096, 1]),
        DeviceDescriptor::new(DeviceType::Storage, "virtio-blk")
            .with_mmio(0x0a00_0000, 0x200)
            .with_irq(48, IrqFlags::empty(), 3)
            .with_aux([512, 0, 0, 0]),
        DeviceDescriptor::new(DeviceType::BusController, "pcie")
            .with_mmio(0x3f00_0000, 0x100_0000)
            .with_aux([0, 255, 0, 0]),
        DeviceDescriptor::new(DeviceType::Rtc, "rtc")
            .with_mmio(0x0901_0000, 0x1000)
            .with_irq(34, IrqFlags::empty(), 0),
        DeviceDescriptor::new(DeviceType::Io, "ps2").with_region(0x60, 0x5),
    ]
}

fn entry_bytes(blob: &[u8], i: usize) -> &[u8] {
    let off = HEADER_SIZE + i * ENTRY_SIZE;
    &blob[off..off + ENTRY_SIZE]
}

#[test]
fn single_uart_layout() {
    let blob = compile(&[uart0()], &CompilerConfig::default()).unwrap();
    let bytes = blob.as_bytes();

    let tree = DevTree::parse(bytes).unwrap();
    assert_eq!(tree.header().entries_count, 1);
    assert_eq!(tree.header().name_list_offset, 24 + 72);
    assert_eq!(entry::REL_NAME_OFFSET.read(entry_bytes(bytes, 0)), 0);
    assert_eq!(tree.name_table(), b"uart0\0");
    assert_eq!(bytes.len(), 24 + 72 + 6);

    let dev = tree.get(0).unwrap();
    assert_eq!(dev.name, "uart0");
    assert_eq!(dev.device_type(), Ok(DeviceType::Uart));
    assert_eq!(dev.entry.entry_flags(), EntryFlags::MMIO);
    assert_eq!(dev.entry.region_base, 0x1000_0000);
    assert_eq!(dev.entry.region_size, 0x1000);
    assert_eq!(dev.entry.irq_lane, 33);
    assert_eq!(dev.entry.irq_flags(), IrqFlags::EDGE_TRIGGER);
    assert_eq!(dev.entry.irq_priority, 1);
    assert_eq!(dev.entry.aux, [0; 4]);
}

#[test]
fn decompile_reproduces_the_input() {
    let devices = board();
    let blob = compile(&devices, &CompilerConfig::default()).unwrap();
    assert_eq!(decompile(blob.as_bytes()).unwrap(), devices);
}

#[test]
fn aux_semantics_survive_the_round_trip() {
    let blob = compile(&board(), &CompilerConfig::default()).unwrap();
    let tree = DevTree::parse(blob.as_bytes()).unwrap();

    let fb = tree.find("fb").unwrap().unwrap();
    assert_eq!(fb.entry.aux_value(devtree_abi::AuxSlot::Stride), Some(4096));
    let uart = tree.find("uart0").unwrap().unwrap();
    assert_eq!(uart.entry.aux_value(devtree_abi::AuxSlot::BaudRate), Some(115_200));
    let pcie = tree.find("pcie").unwrap().unwrap();
    assert_eq!(pcie.entry.aux_value(devtree_abi::AuxSlot::BusEnd), Some(255));
}

#[test]
fn compile_is_deterministic() {
    let cfg = CompilerConfig::default();
    let a = compile(&board(), &cfg).unwrap();
    let b = compile(&board(), &cfg).unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn shared_names_are_stored_once() {
    let devices = [
        uart0(),
        DeviceDescriptor::new(DeviceType::Rtc, "rtc"),
        uart0().with_mmio(0x1000_1000, 0x1000),
    ];
    let blob = compile(&devices, &CompilerConfig::default()).unwrap();
    let bytes = blob.as_bytes();

    let first = entry::REL_NAME_OFFSET.read(entry_bytes(bytes, 0));
    let third = entry::REL_NAME_OFFSET.read(entry_bytes(bytes, 2));
    assert_eq!(first, third);
    assert_eq!(entry::REL_NAME_OFFSET.read(entry_bytes(bytes, 1)), 6);

    let tree = DevTree::parse(bytes).unwrap();
    assert_eq!(tree.name_table(), b"uart0\0rtc\0");
}

#[test]
fn empty_board_is_header_only() {
    let blob = compile(&[], &CompilerConfig::default()).unwrap();
    assert_eq!(blob.len(), HEADER_SIZE);
    let tree = DevTree::parse(blob.as_bytes()).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.header().name_list_offset, 24);
}

#[test]
fn header_flags_come_from_config() {
    let cfg = CompilerConfig::default().with_header_flags(0x8000_0001);
    let blob = compile(&[uart0()], &cfg).unwrap();
    assert_eq!(DevTree::parse(blob.as_bytes()).unwrap().header().flags, 0x8000_0001);
}

#[test]
fn null_mmio_base_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("devtree.odtb");
    let devices = [uart0().with_mmio(0, 0x1000)];

    let err = compile_to_file(&devices, &CompilerConfig::default(), &out).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Validation(ValidationError::AlignmentViolation { index: 0, .. })
    ));
    assert!(!out.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn irq_lane_overflow_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("devtree.odtb");
    let devices = [
        uart0(),
        uart0().with_irq(u64::from(u32::MAX) + 1, IrqFlags::EDGE_TRIGGER, 1),
    ];

    let err = compile_to_file(&devices, &CompilerConfig::default(), &out).unwrap_err();
    assert!(matches!(
        err,
        CompileError::EncodingOverflow { index: 1, field: "irq_lane", .. }
    ));
    assert!(!out.exists());
}

#[test]
fn failed_compile_leaves_previous_output_alone() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("devtree.odtb");
    std::fs::write(&out, b"previous").unwrap();

    let devices = [DeviceDescriptor::new(DeviceType::Rtc, "")];
    assert!(compile_to_file(&devices, &CompilerConfig::default(), &out).is_err());
    assert_eq!(std::fs::read(&out).unwrap(), b"previous");
}

#[test]
fn written_file_matches_in_memory_blob() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("devtree.odtb");
    let blob = compile_to_file(&board(), &CompilerConfig::default(), &out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), blob.as_bytes());
}

#[test]
fn corrupted_signature_is_rejected() {
    let mut bytes = compile(&[uart0()], &CompilerConfig::default())
        .unwrap()
        .into_inner();
    bytes[3] ^= 0xFF;
    assert!(matches!(
        decompile(&bytes),
        Err(CompileError::CorruptBlob(DevTreeError::BadSignature))
    ));
}

#[test]
fn name_offset_past_table_is_rejected() {
    let mut bytes = compile(&[uart0()], &CompilerConfig::default())
        .unwrap()
        .into_inner();
    let off = HEADER_SIZE + entry::REL_NAME_OFFSET.offset;
    bytes[off..off + 4].copy_from_slice(&6u32.to_le_bytes());
    assert!(matches!(
        decompile(&bytes),
        Err(CompileError::CorruptBlob(DevTreeError::NameOutOfRange(6)))
    ));
}

#[test]
fn truncated_blob_is_rejected() {
    let bytes = compile(&board(), &CompilerConfig::default())
        .unwrap()
        .into_inner();
    assert!(matches!(
        decompile(&bytes[..HEADER_SIZE + ENTRY_SIZE]),
        Err(CompileError::CorruptBlob(DevTreeError::Truncated(7)))
    ));
}

#[test]
fn unknown_type_tag_is_rejected_by_decompile() {
    let mut bytes = compile(&[uart0()], &CompilerConfig::default())
        .unwrap()
        .into_inner();
    bytes[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(&9u32.to_le_bytes());
    assert!(matches!(
        decompile(&bytes),
        Err(CompileError::CorruptBlob(DevTreeError::UnknownDeviceType(9)))
    ));
}

#[test]
fn corrupt_name_is_not_reported_as_missing_device() {
    let devices = [
        DeviceDescriptor::new(DeviceType::Rtc, "rtc"),
        DeviceDescriptor::new(DeviceType::Rtc, "rtc2"),
    ];
    let mut bytes = compile(&devices, &CompilerConfig::default())
        .unwrap()
        .into_inner();
    let off = HEADER_SIZE + entry::REL_NAME_OFFSET.offset;
    bytes[off..off + 4].copy_from_slice(&999u32.to_le_bytes());

    let tree = DevTree::parse(&bytes).unwrap();
    assert_eq!(tree.find("rtc2"), Err(DevTreeError::NameOutOfRange(999)));
    let corrupt = tree.of_type(DeviceType::Rtc).filter(Result::is_err).count();
    assert_eq!(corrupt, 1);
    assert!(matches!(
        decompile(&bytes),
        Err(CompileError::CorruptBlob(DevTreeError::NameOutOfRange(999)))
    ));
}

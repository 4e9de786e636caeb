use x65_core::pix::{
    PixError, PixLink, PixMaster, ReplyCode, ReqType, pix_header, pix_message, pix_reply_code,
    pix_reply_payload, pix_response,
};

#[test]
fn test_header_encoding() {
    // [TTT LLLLL], length minus one.
    assert_eq!(pix_message(ReqType::Sync, 1), 0x00);
    assert_eq!(pix_message(ReqType::Ping, 32), 0b001_11111);
    assert_eq!(pix_message(ReqType::MemWrite, 4), 0b010_00011);
    assert_eq!(pix_message(ReqType::DmaWrite, 32), 0b011_11111);

    for req in [
        ReqType::Sync,
        ReqType::Ping,
        ReqType::MemWrite,
        ReqType::DmaWrite,
        ReqType::DevCmd,
        ReqType::DevWrite,
        ReqType::DevRead,
    ] {
        for len in 1..=32 {
            let (bits, decoded_len) = pix_header(pix_message(req, len));
            assert_eq!(ReqType::from_bits(bits), Some(req));
            assert_eq!(decoded_len, len);
        }
    }
}

#[test]
fn test_response_encoding() {
    let word = pix_response(ReplyCode::Pong, 0xAC1);
    assert_eq!(word, 0x1AC1);
    assert_eq!(pix_reply_code(word), ReplyCode::Pong as u8);
    assert_eq!(pix_reply_payload(word), 0xAC1);

    // Payload is truncated to 12 bits.
    assert_eq!(pix_reply_payload(pix_response(ReplyCode::Ack, 0xFFFF)), 0xFFF);
    assert_eq!(pix_reply_code(pix_response(ReplyCode::Nak, 0)), 0xF);
}

#[test]
fn test_link_frames_byte_stream() {
    let mut link = PixLink::new();
    link.push_request(ReqType::MemWrite, &[0x00, 0x12, 0x34, 0x99]);
    link.push_request(ReqType::Sync, &[0]);

    let (bits, payload) = link.pop_request().unwrap();
    assert_eq!(ReqType::from_bits(bits), Some(ReqType::MemWrite));
    assert_eq!(payload, vec![0x00, 0x12, 0x34, 0x99]);

    let (bits, payload) = link.pop_request().unwrap();
    assert_eq!(ReqType::from_bits(bits), Some(ReqType::Sync));
    assert_eq!(payload, vec![0]);
    assert!(link.pop_request().is_none());
}

#[test]
fn test_link_partial_frame() {
    let mut link = PixLink::new();
    link.requests.push_back(pix_message(ReqType::Ping, 3));
    link.requests.push_back(0xAA);
    // Only 2 of 3 payload bytes clocked in so far.
    link.requests.push_back(0xBB);
    assert!(link.pop_request().is_none());
    link.requests.push_back(0xCC);
    let (_, payload) = link.pop_request().unwrap();
    assert_eq!(payload, vec![0xAA, 0xBB, 0xCC]);
}

#[test]
fn test_ack_updates_raster_backchannel() {
    let mut link = PixLink::new();
    let mut master = PixMaster::new();

    master.send_request(&mut link, ReqType::Sync, &[0], false);
    link.replies.push_back(pix_response(ReplyCode::Ack, 123));
    master.drain_replies(&mut link).unwrap();
    assert_eq!(master.vpu_raster(), 123);
}

#[test]
fn test_unexpected_reply_is_fatal() {
    let mut link = PixLink::new();
    let mut master = PixMaster::new();

    link.replies.push_back(pix_response(ReplyCode::Ack, 0));
    assert_eq!(
        master.drain_replies(&mut link),
        Err(PixError::UnexpectedReply(0x0000))
    );
}

#[test]
fn test_response_slot_skips_earlier_replies() {
    let mut link = PixLink::new();
    let mut master = PixMaster::new();

    // Two requests without response, then one with.
    master.send_request(&mut link, ReqType::Sync, &[0], false);
    master.send_request(&mut link, ReqType::Sync, &[0], false);
    master.send_request(&mut link, ReqType::DevRead, &[1, 0x41], true);

    link.replies.push_back(pix_response(ReplyCode::Ack, 10));
    link.replies.push_back(pix_response(ReplyCode::Ack, 11));
    link.replies.push_back(pix_response(ReplyCode::DevData, 0x42));
    master.drain_replies(&mut link).unwrap();

    assert_eq!(master.take_response(), Some(pix_response(ReplyCode::DevData, 0x42)));
    assert_eq!(master.take_response(), None);
}

#[test]
fn test_dev_data_without_slot_is_fatal() {
    let mut link = PixLink::new();
    let mut master = PixMaster::new();

    master.send_request(&mut link, ReqType::Sync, &[0], false);
    link.replies.push_back(pix_response(ReplyCode::DevData, 0x42));
    assert!(matches!(
        master.drain_replies(&mut link),
        Err(PixError::UnexpectedDevData(_))
    ));
}

#[test]
fn test_dma_req_streams_full_bank() {
    let mut link = PixLink::new();
    let mut master = PixMaster::new();

    // The slave answers a SYNC with a DMA_REQ for bank 5.
    master.send_request(&mut link, ReqType::Sync, &[0], false);
    link.pop_request().unwrap();
    link.replies.push_back(pix_response(ReplyCode::DmaReq, 5));
    master.drain_replies(&mut link).unwrap();
    assert!(master.dma_active());

    // The master pumps exactly 2048 DMA_WRITE frames of 32 bytes.
    let mut frames = 0;
    let mut fetches: Vec<(u8, u16)> = Vec::new();
    while master.dma_active() {
        master
            .task(&mut link, 0, |bank, addr| {
                fetches.push((bank, addr));
                [0xA5; 32]
            })
            .unwrap();
        let (bits, payload) = link.pop_request().unwrap();
        assert_eq!(ReqType::from_bits(bits), Some(ReqType::DmaWrite));
        assert_eq!(payload.len(), 32);
        frames += 1;
        link.replies.push_back(pix_response(ReplyCode::Ack, 0));
        master.drain_replies(&mut link).unwrap();
    }
    assert_eq!(frames, 2048);
    assert_eq!(fetches.len(), 2048);
    assert_eq!(fetches[0], (5, 0x0000));
    assert_eq!(fetches[2047], (5, 0xFFE0));
}

#[test]
fn test_idle_task_sends_sync() {
    let mut link = PixLink::new();
    let mut master = PixMaster::new();

    master.task(&mut link, 0, |_, _| [0; 32]).unwrap();
    let (bits, payload) = link.pop_request().unwrap();
    assert_eq!(ReqType::from_bits(bits), Some(ReqType::Sync));
    assert_eq!(payload.len(), 1);
}

#[test]
fn test_watchdog_timeout() {
    let mut link = PixLink::new();
    let mut master = PixMaster::new();

    master.touch(0);
    master.send_request(&mut link, ReqType::Sync, &[0], false);
    // No reply ever arrives; 60 ms later the bridge is declared dead.
    assert_eq!(
        master.task(&mut link, 60_000, |_, _| [0; 32]),
        Err(PixError::Timeout)
    );
}

#[test]
fn test_mem_write_frame_layout() {
    let mut link = PixLink::new();
    let mut master = PixMaster::new();

    master.mem_write(&mut link, 0xABCDEF, 0x42);
    let (bits, payload) = link.pop_request().unwrap();
    assert_eq!(ReqType::from_bits(bits), Some(ReqType::MemWrite));
    // addr23..16, addr15..8, addr7..0, data
    assert_eq!(payload, vec![0xAB, 0xCD, 0xEF, 0x42]);
}

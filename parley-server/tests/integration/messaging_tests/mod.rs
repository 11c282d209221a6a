mod test_broadcast_alone_is_dropped;
mod test_malformed_envelope_ignored;
mod test_offer_relayed_to_other_peer;

mod peer_link;

pub(crate) use peer_link::{PeerEvent, PeerLink};

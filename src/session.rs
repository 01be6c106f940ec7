// Handshake flow:
//
// 1. Initiator sends ProposedCiphers (everything in its catalog)
// 2. Responder picks the largest common key size and sends ChosenCipher,
//    or ChosenCipher:None:None when there is nothing in common
// 3. Initiator checks the choice against what it offered, generates a key
//    pair for the chosen key size and sends DHMKE with its public value
// 4. Responder generates its key pair, computes the shared secret and
//    replies with DHMKE
// 5. Both sides slice the shared secret into cipher key and IV
// 6. Application frames flow in both directions until one side sends the
//    end-of-session signal (an empty message) or the transport fails
//
// Any error closes the session and discards the key material.

use std::sync::Arc;

use crate::catalog::CipherCatalog;
use crate::crypto::{KeyPair, SecureFrame, SessionKeyMaterial, SharedSecret};
use crate::message::{Message, Proposal, PublicValue};
use crate::selector::{select, Selection};
use crate::transport::Transport;
use crate::{Config, Error};

/// Which side of the handshake we are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Proposes ciphers and sends the first public value.
    Initiator,
    /// Selects the cipher and answers.
    Responder,
}

/// Current state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing exchanged yet.
    Init,

    /// The proposal has been sent (initiator) or received (responder).
    ProposalExchanged,

    /// Both sides know the cipher suite.
    CipherSelected,

    /// Public values exchanged and key material derived.
    KeyExchanged,

    /// Send and receive application frames.
    Established,

    /// Terminal. Keys have been discarded.
    Closed,
}

/// One secure channel over one transport.
pub struct Session<T: Transport> {
    role: Role,
    transport: T,
    catalog: Arc<CipherCatalog>,
    config: Arc<Config>,

    /// Current session state.
    state: SessionState,

    /// What the initiator offered. Set on both sides.
    proposal: Option<Proposal>,

    /// Negotiated cipher suite.
    selection: Option<Selection>,

    /// Our ephemeral key pair. Dropped as soon as the secret is derived.
    key_pair: Option<KeyPair>,

    /// Keys for the application frames.
    key_material: Option<SessionKeyMaterial>,
}

impl<T: Transport> Session<T> {
    /// Create a session that will propose ciphers from `catalog`.
    pub fn initiator(transport: T, catalog: Arc<CipherCatalog>, config: Arc<Config>) -> Self {
        Self::new(Role::Initiator, transport, catalog, config)
    }

    /// Create a session that will select from `catalog`.
    pub fn responder(transport: T, catalog: Arc<CipherCatalog>, config: Arc<Config>) -> Self {
        Self::new(Role::Responder, transport, catalog, config)
    }

    fn new(role: Role, transport: T, catalog: Arc<CipherCatalog>, config: Arc<Config>) -> Self {
        Session {
            role,
            transport,
            catalog,
            config,
            state: SessionState::Init,
            proposal: None,
            selection: None,
            key_pair: None,
            key_material: None,
        }
    }

    /// Connect as initiator and run the handshake to completion.
    pub fn start_as_initiator(
        transport: T,
        catalog: Arc<CipherCatalog>,
        config: Arc<Config>,
    ) -> Result<Self, Error> {
        let mut session = Self::initiator(transport, catalog, config);
        session.handshake()?;
        Ok(session)
    }

    /// Accept as responder and run the handshake to completion.
    pub fn start_as_responder(
        transport: T,
        catalog: Arc<CipherCatalog>,
        config: Arc<Config>,
    ) -> Result<Self, Error> {
        let mut session = Self::responder(transport, catalog, config);
        session.handshake()?;
        Ok(session)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Negotiated cipher suite, once known.
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Session keys, available while `Established`.
    pub fn key_material(&self) -> Option<&SessionKeyMaterial> {
        self.key_material.as_ref()
    }

    /// Drive the handshake until the session is `Established`.
    pub fn handshake(&mut self) -> Result<(), Error> {
        loop {
            match self.state {
                SessionState::Established => return Ok(()),
                SessionState::Closed => {
                    return Err(Error::ProtocolState(
                        "Handshake on a closed session".to_string(),
                    ))
                }
                _ => {}
            }

            let prev_state = self.state;
            let result = self.do_handshake_step();
            self.guard(result)?;
            debug!("{:?} {:?} -> {:?}", self.role, prev_state, self.state);
        }
    }

    fn do_handshake_step(&mut self) -> Result<(), Error> {
        match (self.role, self.state) {
            (Role::Initiator, SessionState::Init) => self.send_proposal(),
            (Role::Responder, SessionState::Init) => self.receive_proposal(),
            (Role::Initiator, SessionState::ProposalExchanged) => self.receive_selection(),
            (Role::Responder, SessionState::ProposalExchanged) => self.send_selection(),
            (Role::Initiator, SessionState::CipherSelected) => self.initiate_key_exchange(),
            (Role::Responder, SessionState::CipherSelected) => self.respond_key_exchange(),
            (_, SessionState::KeyExchanged) => {
                self.state = SessionState::Established;
                Ok(())
            }
            (_, SessionState::Established) | (_, SessionState::Closed) => Ok(()),
        }
    }

    fn send_proposal(&mut self) -> Result<(), Error> {
        let proposal = Proposal::from_catalog(&self.catalog);
        self.send_message(&Message::Proposal(proposal.clone()))?;

        self.proposal = Some(proposal);
        self.state = SessionState::ProposalExchanged;
        Ok(())
    }

    fn receive_proposal(&mut self) -> Result<(), Error> {
        let proposal = match self.receive_message()? {
            Message::Proposal(p) => p,
            other => return Err(self.unexpected("Proposal", &other)),
        };

        self.proposal = Some(proposal);
        self.state = SessionState::ProposalExchanged;
        Ok(())
    }

    fn send_selection(&mut self) -> Result<(), Error> {
        let proposal = self.proposal_ref()?;
        let selection = match select(&self.catalog, proposal) {
            Ok(s) => s,
            Err(e) => {
                // Tell the initiator before closing. Our own error wins over
                // a failure to deliver the refusal.
                if let Err(send_err) = self.send_message(&Message::Refusal) {
                    debug!("Failed to send refusal: {}", send_err);
                }
                return Err(e);
            }
        };
        info!("Selected {}{}", selection.cipher, selection.key_size);

        self.send_message(&Message::ChosenCipher(selection.to_message()))?;

        self.selection = Some(selection);
        self.state = SessionState::CipherSelected;
        Ok(())
    }

    fn receive_selection(&mut self) -> Result<(), Error> {
        let chosen = match self.receive_message()? {
            Message::ChosenCipher(c) => c,
            Message::Refusal => {
                return Err(Error::Negotiation(
                    "Peer supports none of the proposed ciphers".to_string(),
                ))
            }
            other => return Err(self.unexpected("ChosenCipher", &other)),
        };

        let proposal = self.proposal_ref()?;
        let selection = Selection::validate(&chosen, &self.catalog, proposal)?;
        info!("Peer selected {}{}", selection.cipher, selection.key_size);

        self.selection = Some(selection);
        self.state = SessionState::CipherSelected;
        Ok(())
    }

    fn initiate_key_exchange(&mut self) -> Result<(), Error> {
        let selection = self.selection_ref()?;
        let key_pair = KeyPair::generate(selection.key_size);
        debug!("Using DH group {}", key_pair.group().id());

        self.send_message(&Message::PublicValue(PublicValue(
            key_pair.public_key().clone(),
        )))?;
        self.key_pair = Some(key_pair);

        let peer = match self.receive_message()? {
            Message::PublicValue(v) => v,
            other => return Err(self.unexpected("PublicValue", &other)),
        };

        let secret = self.compute_shared_secret(&peer)?;
        self.derive_keys(&secret)
    }

    fn respond_key_exchange(&mut self) -> Result<(), Error> {
        let selection = self.selection_ref()?;
        let key_pair = KeyPair::generate(selection.key_size);
        debug!("Using DH group {}", key_pair.group().id());
        let public = PublicValue(key_pair.public_key().clone());
        self.key_pair = Some(key_pair);

        let peer = match self.receive_message()? {
            Message::PublicValue(v) => v,
            other => return Err(self.unexpected("PublicValue", &other)),
        };

        let secret = self.compute_shared_secret(&peer)?;
        self.send_message(&Message::PublicValue(public))?;
        self.derive_keys(&secret)
    }

    fn compute_shared_secret(&mut self, peer: &PublicValue) -> Result<SharedSecret, Error> {
        // The private exponent is not needed once the secret exists.
        let key_pair = self
            .key_pair
            .take()
            .ok_or_else(|| Error::ProtocolState("No key pair".to_string()))?;
        key_pair.compute_shared_secret(&peer.0)
    }

    fn derive_keys(&mut self, secret: &SharedSecret) -> Result<(), Error> {
        let selection = self.selection_ref()?;
        let keys = SessionKeyMaterial::derive(secret, selection.cipher, selection.key_size)?;

        self.key_material = Some(keys);
        self.state = SessionState::KeyExchanged;
        Ok(())
    }

    /// Encrypt and send one application message.
    pub fn send_application_message(&mut self, text: &str) -> Result<(), Error> {
        self.require_established("send")?;

        let result = self.do_send_application_message(text);
        self.guard(result)
    }

    fn do_send_application_message(&mut self, text: &str) -> Result<(), Error> {
        let keys = self
            .key_material
            .as_ref()
            .ok_or_else(|| Error::ProtocolState("No key material".to_string()))?;

        let frame = keys.seal(text.as_bytes())?;
        let mut out = Vec::with_capacity(frame.ciphertext.len() + frame.tag.len());
        frame.serialize(&mut out);

        if out.len() > self.config.max_message_len() {
            return Err(Error::Transport(format!(
                "Frame of {} bytes exceeds limit of {}",
                out.len(),
                self.config.max_message_len()
            )));
        }

        trace!("Send frame: {} bytes", out.len());
        self.transport.send(&out)
    }

    /// Receive and decrypt one application message.
    ///
    /// Returns `None` when the peer ended the session. The session is then
    /// `Closed`.
    ///
    /// Every payload is treated as a frame, so a handshake line arriving
    /// here fails as `Error::Authentication`, or as `Error::Parse` when it
    /// is shorter than a tag.
    pub fn receive_application_message(&mut self) -> Result<Option<String>, Error> {
        self.require_established("receive")?;

        let result = self.do_receive_application_message();
        let received = self.guard(result)?;

        if received.is_none() {
            debug!("Peer ended the session");
            self.discard();
        }

        Ok(received)
    }

    fn do_receive_application_message(&mut self) -> Result<Option<String>, Error> {
        let payload = self.transport.receive(self.config.max_message_len())?;
        trace!("Receive frame: {} bytes", payload.len());

        if payload.is_empty() {
            return Ok(None);
        }

        let keys = self
            .key_material
            .as_ref()
            .ok_or_else(|| Error::ProtocolState("No key material".to_string()))?;

        let frame = SecureFrame::parse(&payload)?;
        let plaintext = keys.open(&frame)?;

        let text = String::from_utf8(plaintext)
            .map_err(|_| Error::Parse("Application message is not UTF-8".to_string()))?;

        Ok(Some(text))
    }

    /// Send the end-of-session signal and close.
    ///
    /// Closing a session that is not `Established` only discards its state.
    pub fn close(&mut self) -> Result<(), Error> {
        let was_established = self.state == SessionState::Established;
        self.discard();

        if was_established {
            debug!("Sending end of session");
            self.transport.send(&[])?;
        }

        Ok(())
    }

    fn send_message(&mut self, message: &Message) -> Result<(), Error> {
        let mut out = String::new();
        message.serialize(&mut out);
        trace!("Send: {}", out);

        self.transport.send(out.as_bytes())
    }

    fn receive_message(&mut self) -> Result<Message, Error> {
        let payload = self.transport.receive(self.config.max_message_len())?;

        let text = std::str::from_utf8(&payload)
            .map_err(|_| Error::Parse("Handshake message is not UTF-8".to_string()))?;
        trace!("Receive: {}", text);

        Message::parse(text)
    }

    fn unexpected(&self, expected: &str, got: &Message) -> Error {
        Error::ProtocolState(format!(
            "Expected {} in state {:?}, got {}",
            expected,
            self.state,
            got.name()
        ))
    }

    fn require_established(&self, what: &str) -> Result<(), Error> {
        if self.state != SessionState::Established {
            return Err(Error::ProtocolState(format!(
                "Cannot {} application data in state {:?}",
                what, self.state
            )));
        }
        Ok(())
    }

    fn proposal_ref(&self) -> Result<&Proposal, Error> {
        self.proposal
            .as_ref()
            .ok_or_else(|| Error::ProtocolState("No proposal".to_string()))
    }

    fn selection_ref(&self) -> Result<Selection, Error> {
        self.selection
            .ok_or_else(|| Error::ProtocolState("No cipher selected".to_string()))
    }

    /// Close the session if `result` is an error.
    fn guard<R>(&mut self, result: Result<R, Error>) -> Result<R, Error> {
        if let Err(e) = &result {
            warn!("Closing {:?} session on {}: {}", self.role, e.kind(), e);
            self.discard();
        }
        result
    }

    fn discard(&mut self) {
        self.key_pair = None;
        self.key_material = None;
        self.state = SessionState::Closed;
    }
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

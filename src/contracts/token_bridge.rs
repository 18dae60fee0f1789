// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Wormhole core bridge and token bridge bindings (EVM)

use alloy_sol_types::sol;

sol!(
    #[allow(clippy::too_many_arguments)]
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract TokenBridge {
        function attestToken(address tokenAddress, uint32 nonce) external payable returns (uint64 sequence);
        function createWrapped(bytes memory encodedVm) external returns (address token);
        function updateWrapped(bytes memory encodedVm) external returns (address token);
        function completeTransfer(bytes memory encodedVm) external;
        function transferTokens(
            address token,
            uint256 amount,
            uint16 recipientChain,
            bytes32 recipient,
            uint256 arbiterFee,
            uint32 nonce
        ) external payable returns (uint64 sequence);
        function wrapAndTransferETH(
            uint16 recipientChain,
            bytes32 recipient,
            uint256 arbiterFee,
            uint32 nonce
        ) external payable returns (uint64 sequence);
        function wrappedAsset(uint16 tokenChainId, bytes32 tokenAddress) external view returns (address);
    }
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract CoreBridge {
        event LogMessagePublished(
            address indexed sender,
            uint64 sequence,
            uint32 nonce,
            bytes payload,
            uint8 consistencyLevel
        );

        function messageFee() external view returns (uint256);
    }
);
